use std::error::Error;

use test_utils::{check_run, Expected};

#[test]
fn alias_observes_reassignment_of_its_target() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int main() var x: int = 3 var p: ~int = &x x = 5 print(itos(~p)) return 0 end",
        Expected { stdout: "5", exit_code: 0 },
    )
}
