//! Multicall dispatch and behavior tests.
//!
//! Behaviors run against a temporary node layout and a fixed version
//! source, so no apiserver or torcx install is needed.

mod helpers;

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::PathBuf;
use std::rc::Rc;

use helpers::{FixedVersion, TestEnv};
use kube_torcx::commands::{Behavior, BehaviorKind, Bootstrap, HookPre};
use kube_torcx::logging::RecordedLevel;
use kube_torcx::multicall::Dispatcher;
use kube_torcx::preflight::{self, CheckStatus};
use kube_torcx::versions::Package;
use kube_torcx::{Config, Error};
use tracing::level_filters::LevelFilter;

fn os(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

/// Handler that records the configs it was run with.
struct Recorder {
    kind: BehaviorKind,
    runs: Rc<RefCell<Vec<(BehaviorKind, Config)>>>,
}

impl Behavior for Recorder {
    fn run(&self, config: &Config) -> anyhow::Result<()> {
        self.runs.borrow_mut().push((self.kind, config.clone()));
        Ok(())
    }
}

// =============================================================================
// Behavior selection
// =============================================================================

#[test]
fn test_select_by_symlink_name() {
    let levels = RecordedLevel::new();
    let dispatcher = Dispatcher::init(&levels).unwrap();

    let argv = os(&["/usr/lib/kube-torcx/kube-torcx-hook-pre", "--verbose=debug"]);
    let (kind, args) = dispatcher.select(argv.clone()).unwrap();
    assert_eq!(kind, BehaviorKind::HookPre);
    assert_eq!(args, argv);

    let (kind, _) = dispatcher.select(["kube-torcx-bootstrap"]).unwrap();
    assert_eq!(kind, BehaviorKind::Bootstrap);
}

#[test]
fn test_select_through_bare_tool_name() {
    let levels = RecordedLevel::new();
    let dispatcher = Dispatcher::init(&levels).unwrap();

    let (kind, args) = dispatcher
        .select(os(&["/usr/bin/kube-torcx", "bootstrap", "--no-verify-signatures"]))
        .unwrap();
    assert_eq!(kind, BehaviorKind::Bootstrap);
    assert_eq!(args, os(&["bootstrap", "--no-verify-signatures"]));

    let (kind, _) = dispatcher
        .select(["kube-torcx", "kube-torcx-hook-pre"])
        .unwrap();
    assert_eq!(kind, BehaviorKind::HookPre);
}

#[test]
fn test_unknown_behavior() {
    let levels = RecordedLevel::new();
    let dispatcher = Dispatcher::init(&levels).unwrap();

    let err = dispatcher.select(["/usr/bin/torcx-something"]).unwrap_err();
    assert!(matches!(err, Error::UnknownBehavior(ref name) if name == "torcx-something"));

    let err = dispatcher.select(["kube-torcx", "install"]).unwrap_err();
    assert!(matches!(err, Error::UnknownBehavior(ref name) if name == "install"));

    let err = dispatcher.select(["kube-torcx"]).unwrap_err();
    assert!(matches!(err, Error::UnknownBehavior(ref name) if name == "kube-torcx"));

    let err = dispatcher.select(Vec::<OsString>::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownBehavior(_)));
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn test_dispatch_runs_selected_behavior_once() {
    let env = TestEnv::new();
    let levels = RecordedLevel::new();
    let runs = Rc::new(RefCell::new(Vec::new()));
    let recorded = runs.clone();
    let dispatcher = Dispatcher::init(&levels).unwrap().with_handlers(move |kind| {
        Box::new(Recorder {
            kind,
            runs: recorded.clone(),
        }) as Box<dyn Behavior>
    });

    let argv = env.argv("kube-torcx-bootstrap", &["--torcx-profile=workers", "--verbose=trace"]);
    dispatcher.dispatch(argv).unwrap();

    let runs = runs.borrow();
    assert_eq!(runs.len(), 1);
    let (kind, config) = &runs[0];
    assert_eq!(*kind, BehaviorKind::Bootstrap);
    assert_eq!(config.profile_name, "workers");
    assert_eq!(config.torcx_bin.as_ref(), Some(&env.torcx_bin));
    assert_eq!(levels.get(), Some(LevelFilter::TRACE));
}

#[test]
fn test_dispatch_never_runs_behavior_on_invalid_config() {
    let env = TestEnv::new();
    let levels = RecordedLevel::new();
    let runs = Rc::new(RefCell::new(Vec::new()));
    let recorded = runs.clone();
    let dispatcher = Dispatcher::init(&levels).unwrap().with_handlers(move |kind| {
        Box::new(Recorder {
            kind,
            runs: recorded.clone(),
        }) as Box<dyn Behavior>
    });

    let err = dispatcher
        .dispatch(env.argv("kube-torcx-hook-pre", &["--torcx-profile="]))
        .unwrap_err();
    assert!(matches!(err, Error::MissingProfile));

    let err = dispatcher
        .dispatch(env.argv("kube-torcx-hook-pre", &["--no-such-flag"]))
        .unwrap_err();
    assert!(matches!(err, Error::Usage(_)));

    assert!(runs.borrow().is_empty());
}

#[test]
fn test_prepare_uses_behavior_default_version_manifest() {
    let levels = RecordedLevel::new();
    let dispatcher = Dispatcher::init(&levels).unwrap();

    for kind in BehaviorKind::ALL {
        let config = dispatcher
            .prepare(kind, os(&[kind.name(), "--torcx-bin=/usr/bin/torcx"]))
            .unwrap();
        assert_eq!(config.version_manifest, kind.default_version_manifest());
    }
    assert_ne!(
        BehaviorKind::Bootstrap.default_version_manifest(),
        BehaviorKind::HookPre.default_version_manifest()
    );
}

#[test]
fn test_behavior_failure_is_reported() {
    let env = TestEnv::new();
    let levels = RecordedLevel::new();
    let dispatcher = Dispatcher::init(&levels).unwrap().with_handlers(|_| {
        Box::new(HookPre::new(Box::new(FixedVersion(Some("v1.9.0"))))) as Box<dyn Behavior>
    });

    let err = dispatcher
        .dispatch(env.argv("kube-torcx-hook-pre", &[]))
        .unwrap_err();
    assert!(matches!(err, Error::Behavior(_)));
    assert!(err.to_string().contains("pre-start checks failed"));
}

// =============================================================================
// Bootstrap
// =============================================================================

fn resolve(env: &TestEnv, kind: BehaviorKind, extra: &[&str]) -> Config {
    let levels = RecordedLevel::new();
    let dispatcher = Dispatcher::init(&levels).unwrap();
    let (kind, args) = dispatcher.select(env.argv(kind.name(), extra)).unwrap();
    dispatcher.prepare(kind, args).unwrap()
}

#[test]
fn test_bootstrap_plan_with_forced_version() {
    let env = TestEnv::new();
    let config = resolve(&env, BehaviorKind::Bootstrap, &["--force-kube-version=v1.15.0+coreos.0"]);

    // The apiserver is never asked when a version is forced.
    let bootstrap = Bootstrap::new(Box::new(FixedVersion(None)), env.release.clone());
    let plan = bootstrap.plan(&config).unwrap();

    assert_eq!(plan.kube_version, "1.15.0");
    assert_eq!(
        plan.packages,
        vec![Package {
            name: "docker".to_string(),
            version: "18.06".to_string()
        }]
    );
    assert_eq!(
        plan.manifest_url,
        "https://tectonic-torcx.release.core-os.net/manifests/amd64-usr/2135.4.0/torcx_manifest.json"
    );
    assert_eq!(plan.profile, "kube-torcx");
    assert_eq!(plan.torcx_bin, env.torcx_bin);
    assert_eq!(plan.keyring, Some(env.keyring.clone()));
}

#[test]
fn test_bootstrap_plan_with_discovered_version() {
    let env = TestEnv::new();
    let config = resolve(
        &env,
        BehaviorKind::Bootstrap,
        &[
            "--torcx-manifest-url=https://mirror.local/{{ kube_version }}/{{ board }}.json",
            "--no-verify-signatures",
        ],
    );

    let bootstrap = Bootstrap::new(Box::new(FixedVersion(Some("v1.14.3"))), env.release.clone());
    let plan = bootstrap.plan(&config).unwrap();

    assert_eq!(plan.kube_version, "1.14.3");
    assert_eq!(plan.packages.len(), 2);
    assert_eq!(plan.manifest_url, "https://mirror.local/1.14.3/amd64-usr.json");
    assert!(!plan.verify_signatures);
    assert_eq!(plan.keyring, None);
}

#[test]
fn test_bootstrap_fails_without_mapping() {
    let env = TestEnv::new();
    let config = resolve(&env, BehaviorKind::Bootstrap, &["--force-kube-version=1.9.0"]);
    let bootstrap = Bootstrap::new(Box::new(FixedVersion(None)), env.release.clone());

    let err = bootstrap.plan(&config).unwrap_err();
    assert!(err.to_string().contains("no runtime mapping for kubernetes 1.9.0"));
}

#[test]
fn test_bootstrap_fails_when_discovery_fails() {
    let env = TestEnv::new();
    let config = resolve(&env, BehaviorKind::Bootstrap, &[]);
    let bootstrap = Bootstrap::new(Box::new(FixedVersion(None)), env.release.clone());

    let err = bootstrap.plan(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("unreachable"));
}

#[test]
fn test_bootstrap_requires_torcx_binary() {
    let env = TestEnv::new();
    let mut config = resolve(&env, BehaviorKind::Bootstrap, &["--force-kube-version=1.15.0"]);
    config.torcx_bin = None;
    let bootstrap = Bootstrap::new(Box::new(FixedVersion(None)), env.release.clone());

    let err = bootstrap.plan(&config).unwrap_err();
    assert!(err.to_string().contains("torcx binary not found"));
}

// =============================================================================
// Hook-pre
// =============================================================================

#[test]
fn test_hook_pre_checks_pass() {
    let env = TestEnv::new();
    let config = resolve(&env, BehaviorKind::HookPre, &["--force-kube-version=1.15.0"]);

    let report = preflight::run_checks(&config, &FixedVersion(None));
    assert!(report.all_passed());
    assert_eq!(report.warn_count(), 0);
    assert_eq!(
        report.get(preflight::CHECK_RUNTIME).unwrap().details.as_deref(),
        Some("docker:18.06")
    );
    HookPre::new(Box::new(FixedVersion(None))).run(&config).unwrap();
}

#[test]
fn test_hook_pre_tolerates_unreachable_apiserver() {
    let env = TestEnv::new();
    let config = resolve(&env, BehaviorKind::HookPre, &[]);

    let report = preflight::run_checks(&config, &FixedVersion(None));
    assert!(report.all_passed());
    assert_eq!(
        report.get(preflight::CHECK_KUBE_VERSION).unwrap().status,
        CheckStatus::Warn
    );
    assert_eq!(
        report.get(preflight::CHECK_RUNTIME).unwrap().status,
        CheckStatus::Skip
    );
}

#[test]
fn test_hook_pre_fails_on_missing_files() {
    let env = TestEnv::new();
    let config = resolve(
        &env,
        BehaviorKind::HookPre,
        &[
            "--force-kube-version=1.15.0",
            "--keyring=/nonexistent/pubring.gpg",
            "--version-manifest=/nonexistent/runtime-mappings.json",
        ],
    );

    let report = preflight::run_checks(&config, &FixedVersion(None));
    assert!(!report.all_passed());
    assert_eq!(
        report.get(preflight::CHECK_KEYRING).unwrap().status,
        CheckStatus::Fail
    );
    assert_eq!(
        report.get(preflight::CHECK_VERSION_MANIFEST).unwrap().status,
        CheckStatus::Fail
    );
    assert_eq!(
        report.get(preflight::CHECK_TORCX_BIN).unwrap().status,
        CheckStatus::Pass
    );
}

#[test]
fn test_hook_pre_skips_keyring_without_verification() {
    let env = TestEnv::new();
    let config = resolve(
        &env,
        BehaviorKind::HookPre,
        &["--force-kube-version=1.15.0", "--no-verify-signatures", "--keyring="],
    );

    let report = preflight::run_checks(&config, &FixedVersion(None));
    assert!(report.all_passed());
    assert_eq!(
        report.get(preflight::CHECK_KEYRING).unwrap().status,
        CheckStatus::Skip
    );
}

#[test]
fn test_torcx_bin_reported_missing() {
    let env = TestEnv::new();
    let missing = PathBuf::from("/nonexistent/torcx");
    let torcx = format!("--torcx-bin={}", missing.display());
    let config = resolve(&env, BehaviorKind::HookPre, &["--force-kube-version=1.15.0", &torcx]);

    let report = preflight::run_checks(&config, &FixedVersion(None));
    assert_eq!(
        report.get(preflight::CHECK_TORCX_BIN).unwrap().status,
        CheckStatus::Fail
    );
}
