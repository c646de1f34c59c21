// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    yes       = { "yes\n", true },
    y         = { "y\n", true },
    shouting  = { "  YES \n", true },
    no        = { "no\n", false },
    empty     = { "\n", false },
    eof       = { "", false },
)]
fn confirmation_answers(answer: &str, expected: bool) {
    assert_eq!(confirmed(answer), expected);
}

#[test]
fn prompt_reads_one_line() {
    let mut input = std::io::Cursor::new("y\nleftover\n");
    assert!(ask("bbl-env", &mut input).unwrap());
}
