use std::error::Error;

use test_utils::{check_run, Expected};

#[test]
fn record_field_write_and_read() -> Result<(), Box<dyn Error>> {
    check_run(
        "type P var v: int = 0 end fun int main() var p = new P p.v = 7 print(itos(p.v)) return 0 end",
        Expected { stdout: "7", exit_code: 0 },
    )
}

#[test]
fn if_else_picks_the_true_branch() -> Result<(), Box<dyn Error>> {
    check_run(
        "fun int main() if 1 < 2 then print(\"y\") else print(\"n\") end return 0 end",
        Expected { stdout: "y", exit_code: 0 },
    )
}

#[test]
fn heap_allocation_is_monotonic() -> Result<(), Box<dyn Error>> {
    check_run(
        "type P var v: int = 0 end fun int main() var a = new P var b = new P a.v = 1 b.v = 2 print(itos(a.v)) print(itos(b.v)) return 0 end",
        Expected { stdout: "12", exit_code: 0 },
    )
}
