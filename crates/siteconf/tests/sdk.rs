//! Tests for the public SDK surface.

use pretty_assertions::assert_eq;
use serde_json::json;
use siteconf::config::{DarkMode, SourceKind};
use siteconf::{ConfigHandle, FragmentSource, ResolveOptions, init_logging, resolve};

/// Hosts read their views from one shared snapshot.
#[test]
fn hosts_share_one_snapshot() {
    init_logging();
    let handle = ConfigHandle::new(resolve(&[FragmentSource::builtin_defaults()]).expect("config"));

    let app_view = handle.current();
    let style_view = handle.current();
    assert_eq!(app_view.app_host().expect("app host").ssr, true);
    assert_eq!(style_view.style_host().expect("style host").icons().len(), 2);

    handle
        .reload(&[
            FragmentSource::builtin_defaults(),
            FragmentSource::inline(SourceKind::User, "override", "{ ssr: false }"),
        ])
        .expect("reload");

    assert_eq!(app_view.get("ssr"), Some(&json!(true)));
    assert_eq!(handle.current().get("ssr"), Some(&json!(false)));
}

/// Logging setup tolerates repeated calls.
#[test]
fn init_logging_is_idempotent() {
    init_logging();
    init_logging();
}

/// A project directory with an entry file is picked up by discovery.
#[test]
fn load_project_uses_entry_file() {
    let temp = tempfile::TempDir::new().expect("tmp");
    std::fs::write(
        temp.path().join("site.config.json5"),
        "{ modules: ['@nuxt/ui'], darkMode: 'class' }",
    )
    .expect("write");

    let options = ResolveOptions::new(temp.path()).isolated();
    let handle = siteconf::load_project_with(&options).expect("handle");
    let config = handle.current();
    assert_eq!(
        config.app_host().expect("app host").modules,
        vec!["@nuxt/ui".to_string()]
    );
    assert_eq!(
        config.style_host().expect("style host").dark_mode,
        DarkMode::Class
    );
    assert_eq!(config.sources().len(), 1);
}

/// Explicit user overrides still apply to isolated discovery.
#[test]
fn load_project_with_user_override() {
    let temp = tempfile::TempDir::new().expect("tmp");
    std::fs::write(temp.path().join("site.config.json5"), "{ ssr: true }").expect("write");
    let user = temp.path().join("local.json5");
    std::fs::write(&user, "{ ssr: false }").expect("write");

    let options = ResolveOptions::new(temp.path())
        .isolated()
        .with_user_path(&user);
    let handle = siteconf::load_project_with(&options).expect("handle");
    assert_eq!(handle.current().get("ssr"), Some(&json!(false)));
}
