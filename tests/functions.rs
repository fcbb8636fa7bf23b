use std::error::Error;

use test_utils::{check_run, Expected};

#[test]
fn calling_another_function_preserves_caller_locals() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int helper() return 0 end fun int main() var x = 7 var y = helper() return x end",
        Expected { stdout: "", exit_code: 7 },
    )
}

#[test]
fn recursive_fibonacci() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int fib(n: int) if n < 2 then return n else return fib(n - 1) + fib(n - 2) end end fun int main() return fib(10) end",
        Expected { stdout: "", exit_code: 55 },
    )
}
