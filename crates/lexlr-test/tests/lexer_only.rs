//! Exercises the lexicon builder and its DFA in isolation, with no
//! syntactic layer involved: build two overlapping keyword patterns and
//! walk the scanner by hand through `Lex`'s public surface.

use lexlr_core::{Journal, Lex, LexiconBuilder, SymbolId, DEFAULT_CONTEXT, ERROR_TERMINAL};

fn build(defs: &[(&str, &str)]) -> Lex {
  let mut journal = Journal::new();
  let mut builder = LexiconBuilder::new("lexer_only");
  for (name, pattern) in defs {
    builder.define(name, pattern, &[]).unwrap();
  }
  builder.build(&mut journal).unwrap()
}

/// Longest-match scan with the §4.C error-terminal fallback: a byte that
/// starts no live pattern is a one-byte `<ERR>` token, not a hard failure.
fn scan(lex: &Lex, input: &[u8]) -> Vec<(SymbolId, usize)> {
  let mut offset = 0usize;
  let mut out = Vec::new();
  while offset < input.len() {
    let mut state = lex.start_state(DEFAULT_CONTEXT);
    let mut len = 0usize;
    // Only the state the walk is about to leave (on a failed transition or
    // at end of input) is consulted for an accept — never an earlier state
    // deeper in the history, even if that earlier state also accepted.
    let best = loop {
      if offset + len >= input.len() {
        break lex.states()[state].accepts.map(|a| (a, len));
      }
      let byte = input[offset + len];
      match lex.states()[state].transitions.get(&byte) {
        Some(next) => {
          state = *next;
          len += 1;
        }
        None => break lex.states()[state].accepts.map(|a| (a, len)),
      }
    };
    match best {
      Some((term, l)) if l > 0 => {
        out.push((term, l));
        offset += l;
      }
      _ => {
        out.push((ERROR_TERMINAL, 1));
        offset += 1;
      }
    }
  }
  out
}

#[test]
fn scanning_int_if_against_overlapping_input_matches_the_pinned_trace() {
  let lex = build(&[("INT", "int"), ("IF", "if")]);
  let int_id = lex.term_id("INT").unwrap();
  let if_id = lex.term_id("IF").unwrap();

  // A stray `z` starts neither pattern, so it is a single-byte `<ERR>`
  // between two clean keyword matches.
  let tokens = scan(&lex, b"intifzint");

  assert_eq!(tokens, vec![(int_id, 3), (if_id, 2), (ERROR_TERMINAL, 1), (int_id, 3)]);
}

#[test]
fn a_failed_partial_match_is_still_a_single_byte_error_not_the_partial_length() {
  // `i` alone starts a live transition (shared prefix of `int`/`if`) but
  // the next byte `s` kills both candidates before either accepts; the
  // walk never backtracks to report a longer, non-accepting prefix — it
  // reports exactly one error byte and resumes from the very next byte.
  let lex = build(&[("INT", "int"), ("IF", "if")]);
  let tokens = scan(&lex, b"is");
  assert_eq!(tokens, vec![(ERROR_TERMINAL, 1), (ERROR_TERMINAL, 1)]);
}

#[test]
fn empty_input_scans_to_nothing() {
  let lex = build(&[("INT", "int")]);
  assert!(scan(&lex, b"").is_empty());
}

#[test]
fn a_byte_that_starts_no_pattern_is_a_single_error_token() {
  let lex = build(&[("INT", "int")]);
  let tokens = scan(&lex, b"z");
  assert_eq!(tokens, vec![(ERROR_TERMINAL, 1)]);
}

#[test]
fn an_earlier_accept_deeper_in_a_dead_walk_is_discarded_not_reused() {
  // "ab" accepts on its own, but "ab[0-9][0-9]" demands exactly two digits
  // after it. Scanning "ab1z" must not fall back to the shorter "ab"
  // accept once the longer candidate dies: the walk only consults the
  // state it is about to leave, which here (after "ab1", right before the
  // dead end at 'z') does not accept at all.
  let lex = build(&[("AB", "ab"), ("AB_NN", "ab[0-9][0-9]")]);
  let tokens = scan(&lex, b"ab1z");
  assert_eq!(tokens, vec![(ERROR_TERMINAL, 1), (ERROR_TERMINAL, 1), (ERROR_TERMINAL, 1), (ERROR_TERMINAL, 1)]);
}
