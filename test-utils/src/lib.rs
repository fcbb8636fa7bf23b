use std::{
    error::Error,
    io::Write,
    process::{Command, Output, Stdio},
    str,
};

const MICA_PATH: &str = "./target/debug/mica";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub exit_code: i32,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(output.status.code(), Some(self.exit_code));
        Ok(())
    }
}

fn run_program(source: &str) -> Result<Output, Box<dyn Error>> {
    let mut child = Command::new(MICA_PATH)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    child
        .stdin
        .take()
        .expect("child stdin was piped")
        .write_all(source.as_bytes())?;

    Ok(child.wait_with_output()?)
}

pub fn check_run(source: &str, expected: Expected) -> Result<(), Box<dyn Error>> {
    let output = run_program(source)?;
    println!("{}", str::from_utf8(&output.stderr)?);
    expected.assert_matches(&output)
}

pub fn check_fails(source: &str) -> Result<(), Box<dyn Error>> {
    let output = run_program(source)?;
    assert!(
        !output.status.success(),
        "expected '{source}' to be rejected, but it ran to completion"
    );
    Ok(())
}
