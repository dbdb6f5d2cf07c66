//! Default record derivation.
//!
//! [`build_defaults`] is a pure function of a [`ProjectContext`]. Feature
//! flags are inferred from dependencies and marker files with plain `OR`
//! logic, so adding a dependency or marker can only turn a flag on.

use serde_json::{Map, Value};

use crate::context::{FRAMEWORK_PACKAGES, ProjectContext};
use crate::schema::{FieldKind, SCHEMA_URL};
use crate::types::{
    Behavior, CodeStyle, ConfigRecord, Features, Framework, Monorepo, RevalidateFrequency,
    ThemeMode,
};
use crate::validate::value_is_valid;

const FALLBACK_NAME: &str = "my-project";
const FALLBACK_AUTHOR: &str = "unknown";
const FALLBACK_VERSION: &str = "0.1.0";
const FALLBACK_LICENSE: &str = "MIT";

/// Capability, dependency that implies it, and the library name recorded.
///
/// The first matching dependency per capability wins.
const LIBRARY_TABLE: &[(&str, &str, &str)] = &[
    ("database", "drizzle-orm", "drizzle"),
    ("database", "@prisma/client", "prisma"),
    ("database", "prisma", "prisma"),
    ("database", "mongoose", "mongoose"),
    ("authentication", "better-auth", "better-auth"),
    ("authentication", "next-auth", "next-auth"),
    ("authentication", "@clerk/nextjs", "clerk"),
    ("authentication", "lucia", "lucia"),
    ("api", "@trpc/server", "trpc"),
    ("api", "hono", "hono"),
    ("i18n", "next-intl", "next-intl"),
    ("i18n", "@inlang/paraglide-js", "paraglide"),
    ("i18n", "i18next", "i18next"),
    ("analytics", "@vercel/analytics", "vercel"),
    ("analytics", "posthog-js", "posthog"),
    ("testing", "vitest", "vitest"),
    ("testing", "jest", "jest"),
    ("testing", "@playwright/test", "playwright"),
    ("styling", "tailwindcss", "tailwind"),
    ("forms", "react-hook-form", "react-hook-form"),
    ("validation", "zod", "zod"),
    ("stateManagement", "zustand", "zustand"),
    ("stateManagement", "jotai", "jotai"),
    ("stateManagement", "@reduxjs/toolkit", "redux-toolkit"),
    ("payments", "stripe", "stripe"),
];

pub(crate) const DATABASE_MARKERS: &[&str] = &["drizzle.config.ts", "prisma/schema.prisma"];
pub(crate) const AUTH_MARKERS: &[&str] = &[
    "src/app/api/auth/[...all]/route.ts",
    "src/app/api/auth/[...nextauth]/route.ts",
];
pub(crate) const I18N_MARKERS: &[&str] = &["src/app/[locale]", "messages"];
pub(crate) const API_MARKERS: &[&str] = &["src/app/api", "src/server/api"];
pub(crate) const TESTING_MARKERS: &[&str] =
    &["vitest.config.ts", "jest.config.js", "playwright.config.ts"];
pub(crate) const DOCKER_MARKERS: &[&str] = &["Dockerfile", "docker-compose.yml", "compose.yaml"];
pub(crate) const CI_MARKERS: &[&str] = &[".github/workflows"];

/// Derive a complete, valid record from project context.
#[must_use]
pub fn build_defaults(ctx: &ProjectContext) -> ConfigRecord {
    let package = &ctx.package;
    let framework = ctx.framework.unwrap_or_default();
    let preferred_libraries = infer_libraries(ctx);

    ConfigRecord {
        schema: Some(SCHEMA_URL.to_owned()),
        project_name: package
            .name
            .clone()
            .or_else(|| ctx.directory_name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_owned()),
        project_author: package
            .author
            .clone()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_AUTHOR.to_owned()),
        project_description: package.description.clone().unwrap_or_default(),
        project_version: package
            .version
            .clone()
            .filter(|v| value_is_valid(FieldKind::Version, &Value::from(v.as_str())))
            .unwrap_or_else(|| FALLBACK_VERSION.to_owned()),
        project_license: package
            .license
            .clone()
            .unwrap_or_else(|| FALLBACK_LICENSE.to_owned()),
        project_repository: package.repository.clone(),
        project_framework: framework,
        project_package_manager: ctx.package_manager.unwrap_or_default(),
        project_framework_version: framework_version(ctx, framework),
        project_runtime: ctx.runtime,
        monorepo: Monorepo {
            kind: ctx.monorepo.unwrap_or_default(),
            packages: package.workspaces.clone(),
            shared_packages: Vec::new(),
        },
        features: infer_features(ctx, &preferred_libraries),
        preferred_libraries,
        code_style: code_style(ctx),
        git_behavior: Behavior::Prompt,
        deploy_behavior: Behavior::Prompt,
        deps_behavior: Behavior::Prompt,
        i18n_behavior: Behavior::Prompt,
        scripts_behavior: Behavior::Prompt,
        ignore_dependencies: Vec::new(),
        custom_rules: Map::new(),
        config_revalidate_frequency: RevalidateFrequency::default(),
        config_last_revalidate: None,
    }
}

fn infer_libraries(ctx: &ProjectContext) -> Map<String, Value> {
    let mut libraries = Map::new();
    for (capability, dependency, library) in LIBRARY_TABLE {
        if ctx.has_dependency(dependency) {
            libraries
                .entry((*capability).to_owned())
                .or_insert_with(|| Value::from(*library));
        }
    }
    libraries
}

fn infer_features(ctx: &ProjectContext, libraries: &Map<String, Value>) -> Features {
    let any_marker = |markers: &[&str]| markers.iter().any(|m| ctx.has_marker(m));
    let has_library = |capability: &str| libraries.contains_key(capability);

    let language = if ctx.has_marker("tsconfig.json") || ctx.has_dependency("typescript") {
        vec!["typescript".to_owned()]
    } else if ctx.package.name.is_some() {
        vec!["javascript".to_owned()]
    } else {
        Features::default().language
    };

    Features {
        i18n: has_library("i18n") || any_marker(I18N_MARKERS),
        analytics: has_library("analytics"),
        theme_mode: ThemeMode::DarkLight,
        authentication: has_library("authentication") || any_marker(AUTH_MARKERS),
        api: has_library("api") || any_marker(API_MARKERS),
        database: has_library("database") || any_marker(DATABASE_MARKERS),
        testing: has_library("testing") || any_marker(TESTING_MARKERS),
        docker: any_marker(DOCKER_MARKERS),
        ci: any_marker(CI_MARKERS),
        language,
        ..Features::default()
    }
}

fn code_style(ctx: &ProjectContext) -> CodeStyle {
    let mut style = CodeStyle::default();
    let Some(fmt) = &ctx.formatter else {
        return style;
    };
    if let Some(width) = fmt.line_width.filter(|w| (1..=1000).contains(w)) {
        style.line_width = width;
    }
    if let Some(indent) = fmt.indent_width.filter(|w| (1..=16).contains(w)) {
        style.indent_size = indent;
    }
    if let Some(v) = fmt.indent_style {
        style.indent_style = v;
    }
    if let Some(v) = fmt.quote_mark {
        style.quote_mark = v;
    }
    if let Some(v) = fmt.semicolons {
        style.semicolons = v;
    }
    if let Some(v) = fmt.trailing_comma {
        style.trailing_comma = v;
    }
    if let Some(v) = fmt.bracket_spacing {
        style.bracket_spacing = v;
    }
    if let Some(v) = fmt.arrow_parens {
        style.arrow_parens = v;
    }
    style
}

/// Declared version of the framework package with range operators stripped.
fn framework_version(ctx: &ProjectContext, framework: Framework) -> Option<String> {
    let (_, package) = FRAMEWORK_PACKAGES.iter().find(|(f, _)| *f == framework)?;
    let range = ctx.package.dependencies.get(*package)?;
    let version = range.trim_start_matches(['^', '~', '>', '=', 'v', ' ']);
    (!version.is_empty() && version.starts_with(|c: char| c.is_ascii_digit()))
        .then(|| version.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FormatterSettings, KNOWN_MARKERS};
    use crate::types::{MonorepoKind, PackageManager, QuoteMark};
    use crate::validate::validate_record;

    #[test]
    fn test_empty_context_yields_valid_fallbacks() {
        let record = build_defaults(&ProjectContext::default());
        assert!(validate_record(&record).is_ok());
        assert_eq!(record.project_name, FALLBACK_NAME);
        assert_eq!(record.project_author, FALLBACK_AUTHOR);
        assert_eq!(record.project_version, FALLBACK_VERSION);
        assert_eq!(record.project_framework, Framework::Nextjs);
        assert_eq!(record.project_package_manager, PackageManager::Npm);
        assert_eq!(record.features.theme_mode, ThemeMode::DarkLight);
        assert_eq!(record.code_style.quote_mark, QuoteMark::Double);
        assert_eq!(record.monorepo.kind, MonorepoKind::None);
        for behavior in [
            record.git_behavior,
            record.deploy_behavior,
            record.deps_behavior,
            record.i18n_behavior,
            record.scripts_behavior,
        ] {
            assert_eq!(behavior, Behavior::Prompt);
        }
        assert!(record.preferred_libraries.is_empty());
        assert!(record.custom_rules.is_empty());
    }

    #[test]
    fn test_package_metadata_used() {
        let mut ctx = ProjectContext::default();
        ctx.package.name = Some("acme".to_owned());
        ctx.package.author = Some("jdoe".to_owned());
        ctx.package.version = Some("2.4.1".to_owned());
        ctx.package.license = Some("Apache-2.0".to_owned());
        let record = build_defaults(&ctx);
        assert_eq!(record.project_name, "acme");
        assert_eq!(record.project_author, "jdoe");
        assert_eq!(record.project_version, "2.4.1");
        assert_eq!(record.project_license, "Apache-2.0");
    }

    #[test]
    fn test_directory_name_fallback_and_bad_version() {
        let mut ctx = ProjectContext {
            directory_name: Some("widget".to_owned()),
            ..ProjectContext::default()
        };
        ctx.package.version = Some("next".to_owned());
        let record = build_defaults(&ctx);
        assert_eq!(record.project_name, "widget");
        assert_eq!(record.project_version, FALLBACK_VERSION);
    }

    #[test]
    fn test_database_inferred_from_dependency_or_marker() {
        let by_dep = build_defaults(&ProjectContext::default().with_dependency("drizzle-orm", "^0.30"));
        assert!(by_dep.features.database);
        assert_eq!(by_dep.preferred_libraries["database"], "drizzle");

        let by_marker =
            build_defaults(&ProjectContext::default().with_marker("prisma/schema.prisma"));
        assert!(by_marker.features.database);
        assert!(!by_marker.preferred_libraries.contains_key("database"));

        assert!(!build_defaults(&ProjectContext::default()).features.database);
    }

    #[test]
    fn test_authentication_inferred_from_route_file() {
        let ctx = ProjectContext::default().with_marker("src/app/api/auth/[...all]/route.ts");
        assert!(build_defaults(&ctx).features.authentication);
    }

    #[test]
    fn test_inference_is_monotonic() {
        let base = ProjectContext::default().with_dependency("vitest", "^2");
        let grown = base
            .clone()
            .with_dependency("better-auth", "^1")
            .with_marker("Dockerfile");

        let before = build_defaults(&base).features;
        let after = build_defaults(&grown).features;
        for (was, now) in [
            (before.testing, after.testing),
            (before.authentication, after.authentication),
            (before.docker, after.docker),
            (before.database, after.database),
        ] {
            assert!(!was || now);
        }
        assert!(after.authentication && after.docker && after.testing);
    }

    #[test]
    fn test_first_library_per_capability_wins() {
        let ctx = ProjectContext::default()
            .with_dependency("@prisma/client", "5")
            .with_dependency("drizzle-orm", "0.30");
        assert_eq!(build_defaults(&ctx).preferred_libraries["database"], "drizzle");
    }

    #[test]
    fn test_formatter_settings_applied() {
        let ctx = ProjectContext {
            formatter: Some(FormatterSettings {
                line_width: Some(120),
                indent_width: Some(4),
                quote_mark: Some(QuoteMark::Single),
                ..FormatterSettings::default()
            }),
            ..ProjectContext::default()
        };
        let style = build_defaults(&ctx).code_style;
        assert_eq!(style.line_width, 120);
        assert_eq!(style.indent_size, 4);
        assert_eq!(style.quote_mark, QuoteMark::Single);
    }

    #[test]
    fn test_out_of_range_formatter_width_ignored() {
        let ctx = ProjectContext {
            formatter: Some(FormatterSettings {
                line_width: Some(5000),
                ..FormatterSettings::default()
            }),
            ..ProjectContext::default()
        };
        assert_eq!(build_defaults(&ctx).code_style.line_width, 80);
    }

    #[test]
    fn test_framework_version_stripped() {
        let ctx = ProjectContext {
            framework: Some(Framework::Nextjs),
            ..ProjectContext::default()
        }
        .with_dependency("next", "^15.1.2");
        assert_eq!(
            build_defaults(&ctx).project_framework_version.as_deref(),
            Some("15.1.2")
        );

        let tagged = ProjectContext {
            framework: Some(Framework::Nextjs),
            ..ProjectContext::default()
        }
        .with_dependency("next", "canary");
        assert!(build_defaults(&tagged).project_framework_version.is_none());
    }

    #[test]
    fn test_feature_markers_are_probed() {
        for group in [
            DATABASE_MARKERS,
            AUTH_MARKERS,
            I18N_MARKERS,
            API_MARKERS,
            TESTING_MARKERS,
            DOCKER_MARKERS,
            CI_MARKERS,
        ] {
            for marker in group {
                assert!(KNOWN_MARKERS.contains(marker), "{marker} is never probed");
            }
        }
    }
}
