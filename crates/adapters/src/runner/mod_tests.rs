// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn tail_keeps_last_lines() {
    let mut tail = Tail::default();
    for i in 0..(TAIL_LINES + 5) {
        tail.push(format!("line {i}"));
    }
    let rendered = tail.render();
    assert_eq!(rendered.lines().count(), TAIL_LINES);
    assert!(rendered.starts_with("line 5\n"));
    assert!(rendered.ends_with(&format!("line {}", TAIL_LINES + 4)));
}

#[test]
fn display_redacts_arguments() {
    let spec = CommandSpec::new("bosh", "bosh")
        .args(["create-env", "--var", "admin_password=s3cret-value"])
        .redactor(Redactor::new(["s3cret-value"]));
    assert_eq!(spec.display(), "bosh create-env --var admin_password=[REDACTED]");
    assert_eq!(spec.subcommand(), Some("create-env"));
}

#[test]
fn log_line_strips_and_redacts() {
    let redactor = Redactor::new(["token-abcdef"]);
    let line = log_line("terraform", "stdout", &redactor, "\u{1b}[1mauth token-abcdef\u{1b}[0m");
    assert_eq!(line, "auth [REDACTED]");
}

#[test]
fn secrets_across_the_length_limit_are_redacted() {
    let secret = "s3cr3t-director-password-value";
    let redactor = Redactor::new([secret]);
    let raw = format!("{}{secret}", "x".repeat(4090));

    let line = log_line("bosh", "stdout", &redactor, &raw);
    assert!(!line.contains("s3cr3t"), "{line}");
    assert!(line.ends_with("...[truncated]"));
}

#[derive(Clone, Default)]
struct Captured(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn tool_output_is_logged_under_the_tool_target() {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        log_line("terraform", "stdout", &Redactor::default(), "Apply complete!");
        log_line("bosh", "stderr", &Redactor::default(), "Compiling packages");
    });

    let text = String::from_utf8(sink.0.lock().clone()).unwrap();
    let line_with = |needle: &str| text.lines().find(|l| l.contains(needle)).unwrap_or_default().to_string();
    assert!(line_with("Apply complete!").contains(" terraform: "), "{text}");
    assert!(line_with("Compiling packages").contains(" bosh: "), "{text}");
}

#[test]
fn interrupted_output_is_not_success() {
    let out = CommandOutput { exit_code: Some(0), interrupted: true, ..CommandOutput::default() };
    assert!(!out.success());
    let out = CommandOutput { exit_code: Some(0), ..CommandOutput::default() };
    assert!(out.success());
}

#[tokio::test]
async fn fake_runner_routes_and_records() {
    let fake = FakeRunner::new();
    fake.on("terraform", Some("output"), |_| FakeResponse::stdout("{}"));
    fake.on("terraform", Some("apply"), |call| {
        assert_eq!(call.env_var("TF_VAR_secret"), Some("x"));
        FakeResponse::exit(1).with_output("Error: quota")
    });

    let cancel = CancellationToken::new();
    let out = fake
        .run(CommandSpec::new("terraform", "terraform").args(["output", "-json"]).capture_stdout(), &cancel)
        .await
        .unwrap();
    assert_eq!(out.stdout, "{}");

    let out = fake
        .run(
            CommandSpec::new("terraform", "terraform")
                .args(["apply"])
                .envs([("TF_VAR_secret".to_string(), "x".to_string())]),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(out.exit_code, Some(1));
    assert_eq!(out.tail, "Error: quota");

    let out = fake.run(CommandSpec::new("bosh", "bosh").args(["create-env"]), &cancel).await.unwrap();
    assert!(out.success());

    assert_eq!(fake.calls().len(), 3);
    assert_eq!(fake.calls_to("terraform", "apply").len(), 1);
}

#[test]
fn spawn_failure_is_an_external_tool_error() {
    let err: BblError = RunnerError::Spawn {
        program: "terraform".into(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    }
    .into();
    assert!(matches!(&err, BblError::ExternalTool { tool, exit_code: None, .. } if tool == "terraform"));
    assert_eq!(err.exit_code(), 2);
}
