//! History file round-trips through the public API.

mod common;

use common::SharedTerm;
use pretty_assertions::assert_eq;
use promptline::{Error, Prompt, PromptOptions};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

fn prompt_with_history(
    input: &str,
    term: &SharedTerm,
    path: &std::path::Path,
    max_size: isize,
) -> Prompt {
    Prompt::new(
        PromptOptions::new()
            .input(Cursor::new(input.as_bytes().to_vec()))
            .output(term.clone())
            .size(80, 24)
            .history(path, max_size),
    )
}

#[test]
fn test_malformed_cookie_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");
    fs::write(&path, "not_the_cookie\nfoo\n").expect("write history");

    let term = SharedTerm::new(80, 24);
    let mut p = prompt_with_history("", &term, &path, 100);
    let err = p.load_history().expect_err("bad cookie");
    assert!(matches!(err, Error::History(_)), "{err}");
}

#[test]
fn test_malformed_escape_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");
    fs::write(&path, "_HiStOrY_V2_\nbroken\\zescape\n").expect("write history");

    let term = SharedTerm::new(80, 24);
    let mut p = prompt_with_history("", &term, &path, 100);
    let err = p.load_history().expect_err("bad escape");
    assert!(matches!(err, Error::History(_)), "{err}");
}

#[test]
fn test_entries_decode_and_navigate() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");
    fs::write(&path, "_HiStOrY_V2_\nhello\\040world;\n").expect("write history");

    let term = SharedTerm::new(80, 24);
    // Up arrow recalls the decoded entry, Enter returns it.
    let mut p = prompt_with_history("\x1b[A\r", &term, &path, 100);
    p.load_history().expect("load");
    let result = p.read_line("> ").expect("input finishes");
    assert_eq!(result, "hello world;");
}

#[test]
fn test_incremental_search_over_loaded_history() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");
    fs::write(&path, "_HiStOrY_V2_\nABC\nABD\n").expect("write history");

    let term = SharedTerm::new(80, 24);
    // Ctrl-R "AB" matches the newest entry; Ctrl-R again steps back; a
    // third Ctrl-R finds nothing and flags the key in the banner.
    let mut p = prompt_with_history("\x12AB\x12\x12", &term, &path, 100);
    p.load_history().expect("load");
    let err = p.read_line("> ").expect_err("input runs out");
    assert!(err.is_eof());
    assert_eq!(term.line(0), "> ABC");
    assert_eq!(term.line(1), "bck?`AB'");
}

#[test]
fn test_finished_input_is_appended() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");

    let term = SharedTerm::new(80, 24);
    let mut p = prompt_with_history("first line\r", &term, &path, 100);
    p.load_history().expect("load creates the file");
    let result = p.read_line("> ").expect("input finishes");
    assert_eq!(result, "first line");
    p.close().expect("close");

    let contents = fs::read_to_string(&path).expect("read history");
    assert_eq!(contents, "_HiStOrY_V2_\nfirst\\040line\n");
}

#[test]
fn test_empty_file_gains_cookie() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");

    let term = SharedTerm::new(80, 24);
    let mut p = prompt_with_history("", &term, &path, 100);
    p.load_history().expect("load");
    p.close().expect("close");

    assert_eq!(
        fs::read_to_string(&path).expect("read history"),
        "_HiStOrY_V2_\n"
    );
}

#[test]
fn test_oversize_file_is_rewritten_with_newest_entries() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");
    fs::write(&path, "_HiStOrY_V2_\ne1\ne2\ne3\ne4\ne5\n").expect("write history");

    let term = SharedTerm::new(80, 24);
    // Five entries against a bound of two: the load keeps e4/e5 and
    // rewrites the file to match.
    let mut p = prompt_with_history("", &term, &path, 2);
    p.load_history().expect("load");
    p.close().expect("close");

    assert_eq!(
        fs::read_to_string(&path).expect("read history"),
        "_HiStOrY_V2_\ne4\ne5\n"
    );
}

#[test]
fn test_adjacent_duplicates_collapse_on_load() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history");
    fs::write(&path, "_HiStOrY_V2_\nsame\nsame\nother\n").expect("write history");

    let term = SharedTerm::new(80, 24);
    // Up recalls "other", Up again "same"; the duplicate was elided so a
    // third Up stays put.
    let mut p = prompt_with_history("\x1b[A\x1b[A\x1b[A\r", &term, &path, 100);
    p.load_history().expect("load");
    let result = p.read_line("> ").expect("input finishes");
    assert_eq!(result, "same");
}
