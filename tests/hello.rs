use std::error::Error;

use test_utils::{check_run, Expected};

#[test]
fn prints_and_returns_exit_code() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int main() print(\"hi\\n\") return 1 end",
        Expected { stdout: "hi\n", exit_code: 1 },
    )
}

#[test]
fn empty_main_returns_zero() -> Result<(), Box<dyn Error>> {
    check_run("fun int main() return 0 end", Expected { stdout: "", exit_code: 0 })
}
