use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;

const SCRIPT: &str = "\
# captions at [1,3), [5,8) and [10,12)
caption 1 1 3 one
caption 2 5 8 two
caption 3 10 12 three

at 0
at 2
at 4
at 6
at 9
at 11
at 13
";

fn subsync() -> Command {
    Command::new(env!("CARGO_BIN_EXE_subsync"))
}

#[test]
fn replays_script_from_file() {
    let mut script = NamedTempFile::new().unwrap();
    script.write_all(SCRIPT.as_bytes()).unwrap();
    let out = NamedTempFile::new().unwrap();

    let status = subsync()
        .arg("--input")
        .arg(script.path())
        .arg("--output")
        .arg(out.path())
        .arg("--track")
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(
        std::fs::read_to_string(out.path()).unwrap(),
        "2.000 caption 1 one\n\
         4.000 none\n\
         6.000 caption 2 two\n\
         9.000 none\n\
         11.000 caption 3 three\n\
         13.000 none\n\
         13.000 finished\n\
         track 1 2 3\n"
    );
}

#[test]
fn seek_from_stdin() {
    let mut child = subsync()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"caption 1 1 3 one\ncaption 2 5 8 two\nat 6\nat 6\nremove 2\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "6.000 caption 2 two\n6.000 none\n"
    );
}

#[test]
fn reports_parse_errors() {
    let mut script = NamedTempFile::new().unwrap();
    script.write_all(b"at 1\nrewind 4\n").unwrap();

    let output = subsync().arg("-i").arg(script.path()).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Failed to parse script"));
    assert!(stderr.contains("line 2"));
}
