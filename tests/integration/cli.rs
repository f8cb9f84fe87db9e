use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::{PROFILE_TEMPLATE, TemplateRoot};

/// Render to stdout with inline variables
#[test]
fn test_render_to_stdout() {
    let root = TemplateRoot::new().unwrap();
    root.write_object("template/test.hbs", PROFILE_TEMPLATE).unwrap();

    root.run_renderd(&[
        "render",
        "template/test.hbs",
        "--vars",
        r#"{"title":"Hello","user":{"name":"John","role":"Admin"}}"#,
    ])
    .unwrap()
    .assert_success()
    .assert_stdout_contains("<!DOCTYPE html>")
    .assert_stdout_contains("<h1>Hello</h1><p>John (Admin)</p>");
}

#[test]
fn test_render_vars_file_to_output() {
    let root = TemplateRoot::new().unwrap();
    root.write_object("template/test.hbs", PROFILE_TEMPLATE).unwrap();
    root.write_work_file("vars.json", r#"{"title":"From file"}"#).unwrap();

    root.run_renderd(&["render", "template/test.hbs", "--vars-file", "vars.json", "-o", "out.html"])
        .unwrap()
        .assert_success();

    let html = std::fs::read_to_string(root.work_path().join("out.html")).unwrap();
    assert!(html.contains("<h1>From file</h1>"));
}

#[test]
fn test_render_rejects_bad_key() {
    let root = TemplateRoot::new().unwrap();
    let output = root.run_renderd(&["render", "template/test.txt"]).unwrap();
    output.assert_failure().assert_stderr_contains("Invalid request");
    assert_eq!(output.code, Some(1));
}

#[test]
fn test_render_unsafe_template_fails() {
    let root = TemplateRoot::new().unwrap();
    root.write_object("template/xss.hbs", "<p>hi</p><script>alert(1)</script>").unwrap();

    root.run_renderd(&["render", "template/xss.hbs"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("unsafe script tags");
}

#[test]
fn test_render_missing_template_fails() {
    let root = TemplateRoot::new().unwrap();
    root.run_renderd(&["render", "template/none.hbs"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Template not found or inaccessible");
}

#[test]
fn test_render_with_config_file() {
    let root = TemplateRoot::new().unwrap();
    root.write_object("template/small.hbs", "<p>{{ name }}</p>").unwrap();
    let config = format!(
        "max_template_size = 4096\n\n[storage]\nroot = {:?}\n",
        root.store_path().display().to_string()
    );
    let config_path = root.write_work_file("renderd.toml", &config).unwrap();

    let mut cmd = Command::cargo_bin("renderd").unwrap();
    cmd.current_dir(root.work_path())
        .env_remove("RENDERD_STORAGE_ROOT")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config_path)
        .args(["render", "template/small.hbs", "--vars", r#"{"name":"Ada"}"#]);
    cmd.assert().success().stdout(predicate::str::contains("<p>Ada</p>"));
}

#[test]
fn test_invalid_config_number_is_reported() {
    let root = TemplateRoot::new().unwrap();
    let mut cmd = Command::cargo_bin("renderd").unwrap();
    cmd.current_dir(root.work_path())
        .env("RENDERD_CONFIG", root.work_path().join("absent.toml"))
        .env("RENDERD_STORAGE_ROOT", root.store_path())
        .env("RENDERD_CACHE_TTL_SECS", "soon")
        .env("NO_COLOR", "1")
        .args(["render", "template/a.hbs"]);
    cmd.assert().failure().stderr(predicate::str::contains("RENDERD_CACHE_TTL_SECS"));
}

#[test]
fn test_validate_prints_completed_document() {
    let root = TemplateRoot::new().unwrap();
    let path = root.write_work_file("fragment.hbs", "<h1>{{title}}</h1>").unwrap();

    let mut cmd = Command::cargo_bin("renderd").unwrap();
    cmd.arg("validate").arg(&path);
    cmd.assert().success().stdout(predicate::str::contains(
        "<!DOCTYPE html>\n<html>\n<head></head>\n<body>\n<h1>{{title}}</h1>\n</body>\n</html>",
    ));
}

#[test]
fn test_validate_check_rejects_scripts() {
    let root = TemplateRoot::new().unwrap();
    let safe = root.write_work_file("safe.hbs", "<p>fine</p>").unwrap();
    let unsafe_doc = root.write_work_file("unsafe.hbs", "<div><script>x()</script></div>").unwrap();

    let mut cmd = Command::cargo_bin("renderd").unwrap();
    cmd.env("NO_COLOR", "1").args(["validate", "--check"]).arg(&safe);
    cmd.assert().success().stdout(predicate::str::contains("is safe"));

    let mut cmd = Command::cargo_bin("renderd").unwrap();
    cmd.env("NO_COLOR", "1").args(["validate", "--check"]).arg(&unsafe_doc);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unsafe script tags"))
        .stderr(predicate::str::contains("Remove all <script> elements"));
}
