use assert_cmd::Command;

fn catalog() -> Command {
    let mut cmd = Command::cargo_bin("catalog").unwrap();
    cmd.env("CATALOG_ENV", "local")
        .env("CATALOG_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = catalog().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for name in ["serve", "shell", "check-config"] {
        assert!(stdout.contains(name), "missing {name}");
    }
}

#[test]
fn check_config_reads_environment_overrides() {
    let output = catalog()
        .arg("check-config")
        .env("CATALOG_DATABASE__PRODUCTS_TABLE", "items")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("database: memory"));
    assert!(stdout.contains("products=items"));
}

#[test]
fn non_local_environment_needs_a_secret() {
    let output = catalog()
        .arg("check-config")
        .env("CATALOG_ENV", "production")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn scripted_shell_session() {
    let output = catalog()
        .arg("shell")
        .write_stdin(
            "list\n\
             signup cli@example.com secret12\n\
             create\nDesk\nOak writing desk\nHome\n120\n4.5\n\
             filter search desk\n\
             apply\n\
             whoami\n\
             quit\n",
        )
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("sign in required"));
    assert!(stdout.contains("signed in as cli@example.com"));
    assert!(stdout.contains("1 product(s)"));
    assert!(stdout.contains("Desk"));
}
