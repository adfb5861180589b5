//! Command-line tests against the built binary.
//!
//! None of these reach a device: they cover help, usage errors and an
//! unreachable bridge.

use assert_cmd::Command as AssertCommand;

fn cipher_cmd() -> AssertCommand {
    let mut cmd = AssertCommand::new(assert_cmd::cargo::cargo_bin!("trezor-cipher"));
    cmd.env_remove("TREZOR_BRIDGE_URL")
        .env_remove("TREZOR_ASKPASS")
        .env_remove("TREZOR_CIPHER_VALUE")
        .env_remove("RUST_LOG");
    cmd
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// =============================================================================
// Help and usage errors
// =============================================================================

mod usage {
    use super::*;

    #[test]
    fn test_help_goes_to_stderr_and_exits_zero() {
        let output = cipher_cmd().arg("-h").output().unwrap();

        assert_eq!(output.status.code(), Some(0));
        assert!(output.stdout.is_empty());
        let stderr = stderr_of(&output);
        assert!(stderr.contains("--Hi"), "usage missing flags: {}", stderr);
        assert!(stderr.contains("-k"));
    }

    #[test]
    fn test_double_dash_help_is_accepted() {
        let output = cipher_cmd().arg("--h").output().unwrap();
        assert_eq!(output.status.code(), Some(0));
    }

    #[test]
    fn test_unknown_flag_exits_einval() {
        let output = cipher_cmd().arg("-x").output().unwrap();

        assert_eq!(output.status.code(), Some(22));
        assert!(output.stdout.is_empty());
        assert!(stderr_of(&output).contains("Usage"));
    }

    #[test]
    fn test_bad_derivation_path_exits_einval() {
        let output = cipher_cmd().args(["--path", "m/x", "-v", "abc"]).output().unwrap();

        assert_eq!(output.status.code(), Some(22));
        assert!(stderr_of(&output).contains("m/x"));
    }

    #[test]
    fn test_help_switch_with_bool_value() {
        let output = cipher_cmd().arg("-h=true").output().unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert!(stderr_of(&output).contains("--Hi"));
    }

    #[test]
    fn test_bad_passphrase_policy_exits_einval() {
        let output = cipher_cmd()
            .args(["--passphrase-failure", "ignore"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(22));
    }
}

// =============================================================================
// Host errors
// =============================================================================

mod host_errors {
    use super::*;

    #[test]
    fn test_unreachable_bridge_is_a_host_error() {
        let output = cipher_cmd()
            .args(["--bridge-url", "http://127.0.0.1:1", "-e", "-v", "TEST VALUE"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(255));
        assert!(output.stdout.is_empty());
        assert!(stderr_of(&output).contains("Got error"));
    }

    #[test]
    fn test_bridge_url_from_environment() {
        let output = cipher_cmd()
            .env("TREZOR_BRIDGE_URL", "http://127.0.0.1:1")
            .args(["-v", "00", "-Hi"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(255));
        assert!(stderr_of(&output).contains("127.0.0.1:1"));
    }

    #[test]
    fn test_go_bool_forms_and_trailing_arguments_are_accepted() {
        let output = cipher_cmd()
            .args([
                "--bridge-url",
                "http://127.0.0.1:1",
                "-e=false",
                "-Hi=true",
                "-v",
                "00ff",
                "extra",
                "-x",
            ])
            .output()
            .unwrap();

        // Flags parsed; the run fails only at the bridge.
        assert_eq!(output.status.code(), Some(255));
        assert!(stderr_of(&output).contains("Got error"));
    }
}
