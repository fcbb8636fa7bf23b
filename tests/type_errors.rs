use std::error::Error;

use test_utils::check_fails;

#[test]
fn rejects_missing_main() -> Result<(), Box<dyn Error>> {
    check_fails("fun int notmain() return 0 end")
}

#[test]
fn rejects_mixed_numeric_addition() -> Result<(), Box<dyn Error>> {
    check_fails("fun int main() var x = 5 + 2.0 return 0 end")
}

#[test]
fn rejects_division_by_zero_at_runtime() -> Result<(), Box<dyn Error>> {
    check_fails("fun int main() var x = 1 / 0 return x end")
}
