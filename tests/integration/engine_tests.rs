//! End-to-end engine tests
//!
//! These build realistic Composer project trees in temp directories and run
//! the full resolution pass through the library, exercising manifest
//! reading, the install tree, discovery, extraction, indexing, and
//! classification together.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use deadrequire::classify::{Classification, ClassifyPolicy};
use deadrequire::config::{Config, ZeroMappingPolicy};
use deadrequire::engine::resolve;
use deadrequire::filter::{Filter, FilterPipeline};

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn no_filters() -> FilterPipeline {
    FilterPipeline::with_builtin(Vec::new())
}

/// A project tree with one used and one unused dependency.
fn mixed_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {
        "psr/log": "^3.0",
        "symfony/console": "^6.0"
    },
    "autoload": {
        "psr-4": {"Acme\\": "src/"}
    }
}"#,
    );
    write(
        root,
        "src/Service.php",
        r#"<?php

namespace Acme;

use Psr\Log\LoggerInterface;

class Service
{
    public function __construct(private LoggerInterface $logger)
    {
    }
}
"#,
    );
    write(
        root,
        "vendor/composer/installed.json",
        r#"{"packages": [
            {"name": "psr/log", "install-path": "../psr/log",
             "autoload": {"psr-4": {"Psr\\Log\\": "src"}}},
            {"name": "symfony/console", "install-path": "../symfony/console",
             "autoload": {"psr-4": {"Symfony\\Component\\Console\\": ""}}}
        ]}"#,
    );
    write(
        root,
        "vendor/psr/log/src/LoggerInterface.php",
        "<?php\nnamespace Psr\\Log;\ninterface LoggerInterface {}\n",
    );
    write(
        root,
        "vendor/symfony/console/Application.php",
        "<?php\nnamespace Symfony\\Component\\Console;\nclass Application {}\n",
    );
    dir
}

fn classification_of(
    resolution: &deadrequire::engine::Resolution,
    package: &str,
) -> Classification {
    resolution
        .analysis
        .outcomes
        .iter()
        .find(|o| o.dependency.name == package)
        .unwrap_or_else(|| panic!("no outcome for {}", package))
        .classification
        .clone()
}

#[test]
fn test_mixed_project_used_and_unused() {
    let dir = mixed_project();
    let resolution = resolve(
        &dir.path().join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(classification_of(&resolution, "psr/log"), Classification::Used);
    assert_eq!(
        classification_of(&resolution, "symfony/console"),
        Classification::Unused
    );
    let counts = resolution.analysis.counts();
    assert_eq!(counts.used, 1);
    assert_eq!(counts.unused, 1);
    assert!(resolution.analysis.is_failure());
}

#[test]
fn test_exclude_filter_moves_package_to_ignored() {
    let dir = mixed_project();
    let filters = FilterPipeline::with_builtin(vec![Filter::named(["symfony/console"])]);
    let resolution = resolve(
        &dir.path().join("composer.json"),
        &Config::default(),
        &filters,
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(
        classification_of(&resolution, "symfony/console"),
        Classification::Ignored("NamedFilter [symfony/console]".to_string())
    );
    assert!(!resolution.analysis.is_failure());
}

#[test]
fn test_pattern_filter_matches_vendor_prefix() {
    let dir = mixed_project();
    let filters = FilterPipeline::with_builtin(vec![Filter::pattern("symfony/*")]);
    let resolution = resolve(
        &dir.path().join("composer.json"),
        &Config::default(),
        &filters,
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(
        classification_of(&resolution, "symfony/console"),
        Classification::Ignored("PatternFilter [symfony/*]".to_string())
    );
}

#[test]
fn test_platform_requirements_are_used() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {"php": ">=8.1", "ext-json": "*", "ext-mbstring": "*"},
    "autoload": {"psr-4": {"Acme\\": "src/"}}
}"#,
    );
    write(root, "src/App.php", "<?php\nnamespace Acme;\nclass App {}\n");

    let resolution = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    let counts = resolution.analysis.counts();
    assert_eq!(counts.used, 3);
    assert_eq!(counts.unused, 0);
    assert!(!resolution.analysis.is_failure());
}

#[test]
fn test_zombie_detected_from_install_tree() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {},
    "autoload": {"psr-4": {"Acme\\": "src/"}}
}"#,
    );
    write(
        root,
        "src/App.php",
        "<?php\nnamespace Acme;\nuse Hidden\\Helper;\nclass App { public function go() { return new Helper(); } }\n",
    );
    write(
        root,
        "vendor/composer/installed.json",
        r#"{"packages": [{"name": "hidden/pkg", "install-path": "../hidden/pkg",
            "autoload": {"psr-4": {"Hidden\\": "src"}}}]}"#,
    );
    write(
        root,
        "vendor/hidden/pkg/src/Helper.php",
        "<?php\nnamespace Hidden;\nclass Helper {}\n",
    );

    let resolution = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(resolution.analysis.zombies.len(), 1);
    assert_eq!(resolution.analysis.zombies[0].package, "hidden/pkg");
    assert!(resolution.analysis.is_failure());
}

#[test]
fn test_declaring_the_package_suppresses_the_zombie() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {"hidden/pkg": "^1.0"},
    "autoload": {"psr-4": {"Acme\\": "src/"}}
}"#,
    );
    write(
        root,
        "src/App.php",
        "<?php\nnamespace Acme;\nuse Hidden\\Helper;\nclass App { private Helper $h; }\n",
    );
    write(
        root,
        "vendor/composer/installed.json",
        r#"{"packages": [{"name": "hidden/pkg", "install-path": "../hidden/pkg",
            "autoload": {"psr-4": {"Hidden\\": "src"}}}]}"#,
    );
    write(
        root,
        "vendor/hidden/pkg/src/Helper.php",
        "<?php\nnamespace Hidden;\nclass Helper {}\n",
    );

    let resolution = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert!(resolution.analysis.zombies.is_empty());
    assert_eq!(classification_of(&resolution, "hidden/pkg"), Classification::Used);
}

#[test]
fn test_classmap_autoload_resolves_usage() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {"legacy/lib": "^1.0"},
    "autoload": {"psr-4": {"Acme\\": "src/"}}
}"#,
    );
    write(
        root,
        "src/App.php",
        "<?php\nnamespace Acme;\nclass App { public function go() { return new \\Legacy_Mailer(); } }\n",
    );
    write(
        root,
        "vendor/composer/installed.json",
        r#"{"packages": [{"name": "legacy/lib", "install-path": "../legacy/lib",
            "autoload": {"classmap": ["lib/"]}}]}"#,
    );
    write(
        root,
        "vendor/legacy/lib/lib/Mailer.php",
        "<?php\nclass Legacy_Mailer {}\n",
    );

    let resolution = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(classification_of(&resolution, "legacy/lib"), Classification::Used);
}

#[test]
fn test_excluded_dir_hides_usage() {
    let dir = mixed_project();
    let root = dir.path();
    // Move the only consuming file into a directory the config excludes.
    fs::create_dir_all(root.join("src/Generated")).unwrap();
    fs::rename(
        root.join("src/Service.php"),
        root.join("src/Generated/Service.php"),
    )
    .unwrap();

    let config = Config {
        exclude_dirs: vec!["Generated".to_string()],
        ..Config::default()
    };
    let resolution = resolve(
        &root.join("composer.json"),
        &config,
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(classification_of(&resolution, "psr/log"), Classification::Unused);
    assert_eq!(resolution.scanned_files, 0);
}

#[test]
fn test_extra_file_contributes_usage() {
    let dir = mixed_project();
    let root = dir.path();
    write(
        root,
        "scripts/console.php",
        "<?php\nuse Symfony\\Component\\Console\\Application;\n$app = new Application();\n",
    );

    let config = Config {
        extra_files: vec![root.join("scripts/console.php")],
        ..Config::default()
    };
    let resolution = resolve(
        &root.join("composer.json"),
        &config,
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert_eq!(
        classification_of(&resolution, "symfony/console"),
        Classification::Used
    );
    assert_eq!(resolution.analysis.counts().unused, 0);
}

#[test]
fn test_zero_mapping_policy_ignored() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {"behaviour/only-plugin": "^2.0"},
    "autoload": {"psr-4": {"Acme\\": "src/"}}
}"#,
    );
    write(root, "src/App.php", "<?php\nnamespace Acme;\nclass App {}\n");
    write(
        root,
        "vendor/composer/installed.json",
        r#"{"packages": [{"name": "behaviour/only-plugin", "install-path": "../behaviour/only-plugin"}]}"#,
    );

    let config = Config {
        zero_mapping: ZeroMappingPolicy::Ignored,
        ..Config::default()
    };
    let resolution = resolve(
        &root.join("composer.json"),
        &config,
        &no_filters(),
        config.classify_policy(),
        None,
    )
    .unwrap();

    assert!(matches!(
        classification_of(&resolution, "behaviour/only-plugin"),
        Classification::Ignored(_)
    ));
    assert!(!resolution.analysis.is_failure());
}

#[test]
fn test_special_packages_are_ignored_by_default() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{
    "name": "acme/app",
    "require": {"composer-plugin-api": "^2.0", "composer-runtime-api": "^2.0"},
    "autoload": {"psr-4": {"Acme\\": "src/"}}
}"#,
    );
    write(root, "src/App.php", "<?php\nnamespace Acme;\nclass App {}\n");

    let resolution = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    let counts = resolution.analysis.counts();
    assert_eq!(counts.ignored, 2);
    assert_eq!(counts.unused, 0);
    assert!(!resolution.analysis.is_failure());
}

#[test]
fn test_missing_installed_json_warns_but_runs() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{"name": "acme/app", "require": {"psr/log": "^3.0"}, "autoload": {"psr-4": {"Acme\\": "src/"}}}"#,
    );
    write(root, "src/App.php", "<?php\nnamespace Acme;\nclass App {}\n");

    let resolution = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();

    assert!(resolution
        .warnings
        .iter()
        .any(|w| w.contains("installed.json")));
    // With no install tree the dependency has no mappings and falls back
    // to the zero-mapping policy.
    assert_eq!(classification_of(&resolution, "psr/log"), Classification::Unused);
}

#[test]
fn test_composer_v1_install_tree_is_fatal() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "composer.json",
        r#"{"name": "acme/app", "require": {}, "autoload": {"psr-4": {"Acme\\": "src/"}}}"#,
    );
    write(root, "src/App.php", "<?php\nnamespace Acme;\nclass App {}\n");
    write(
        root,
        "vendor/composer/installed.json",
        r#"[{"name": "old/pkg"}]"#,
    );

    let err = resolve(
        &root.join("composer.json"),
        &Config::default(),
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap_err();
    assert!(format!("{:?}", err).contains("Composer Version 1 is not supported"));
}

#[test]
fn test_lenient_mode_skips_unreadable_extra_file() {
    let dir = mixed_project();
    let root = dir.path();
    // Invalid UTF-8 makes the file unextractable while discovery still
    // picks it up.
    fs::create_dir_all(root.join("scripts")).unwrap();
    fs::write(root.join("scripts/broken.php"), [0xFF, 0xFE, 0x80]).unwrap();

    let mut config = Config {
        extra_files: vec![root.join("scripts/broken.php")],
        ..Config::default()
    };

    // Fail-closed by default.
    assert!(resolve(
        &root.join("composer.json"),
        &config,
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .is_err());

    config.lenient = true;
    let resolution = resolve(
        &root.join("composer.json"),
        &config,
        &no_filters(),
        ClassifyPolicy::default(),
        None,
    )
    .unwrap();
    assert!(resolution.warnings.iter().any(|w| w.contains("broken.php")));
    assert_eq!(classification_of(&resolution, "psr/log"), Classification::Used);
}
