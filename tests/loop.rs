use std::error::Error;

use test_utils::{check_run, Expected};

#[test]
fn for_loop_sums_into_x() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int main() var x = 0 for i = 1 to 5 do x = x + i end print(itos(x)) return 0 end",
        Expected { stdout: "10", exit_code: 0 },
    )
}

#[test]
fn while_loop_counts_up() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int main() var x = 0 while x < 5 do print(itos(x)) x = x + 1 end return 0 end",
        Expected { stdout: "01234", exit_code: 0 },
    )
}
