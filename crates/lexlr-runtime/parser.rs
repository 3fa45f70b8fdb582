//! The parser driver: a thread-based shift/reduce/ignore walk over a built
//! [`Syntax`], forking only when the multi-context scanner itself is
//! ambiguous at the current offset (never on a grammar action — the
//! [`lexlr_syntax`] builder refuses to produce a syntax with an unresolved
//! shift/reduce or reduce/reduce conflict, so table lookup here is always
//! deterministic).

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use lexlr_core::{ContextId, Lex, SymbolId, DEFAULT_CONTEXT, EOF_TERMINAL};
use lexlr_syntax::Syntax;
use serde_json::Value;

use crate::ast::{Ast, Root, RootNode};
use crate::config::ParserOptions;
use crate::error::ParseError;

/// A single in-progress parse path: its state stack, the `Ast` built so far
/// for each stacked symbol, the offset of the next unconsumed byte, and the
/// ignored tokens skipped along the way that have not yet been reattached
/// to a reduced node.
#[derive(Clone)]
struct Thread {
  states:          Vec<usize>,
  syms:            Vec<Ast>,
  ignored_pending: Vec<Ast>,
  offset:          usize,
  checked_lazy:    bool,
}

enum ThreadOutcome {
  Active(Thread),
  Accepted(Thread, Ast),
  /// Carries the offset it died at, so the furthest-progress failure can be
  /// preferred when every thread eventually dies.
  Dead(ParseError, usize),
}

/// Drives one [`Syntax`] over input documents. Cheap to keep around and
/// reuse across many `parse` calls; holds nothing but the shared, immutable
/// `Syntax`.
pub struct Parser {
  syntax: Arc<Syntax>,
}

impl Parser {
  pub fn new(syntax: Arc<Syntax>) -> Self {
    Self { syntax }
  }

  pub fn syntax(&self) -> &Arc<Syntax> {
    &self.syntax
  }

  /// Parses `document` under `options`, returning the accepted tree's
  /// owning [`Root`]. Forks internally on lexical ambiguity and prunes
  /// dead ends; an input that drives every live thread to a dead end
  /// reports the error of whichever thread got furthest.
  pub fn parse(&self, document: lexlr_core::Document, options: &ParserOptions) -> Result<Root, ParseError> {
    let path = document.path().map(|p| p.display().to_string());
    let root = RootNode::new(document, self.syntax.clone());
    let bytes = root.document().as_bytes().to_vec();

    match self.run(&bytes, &root, options, &path) {
      Ok((content, prefix, suffix)) => {
        root.finalize(content, prefix, suffix);
        Ok(Root::new(root))
      }
      Err(err) => {
        if options.truncate_on_error() {
          if let ParseError::UnexpectedToken { at, .. } = &err {
            if let Some(truncated) = self.retry_truncated(&root, &bytes, options, &path, at) {
              return truncated;
            }
          }
        }
        Err(err)
      }
    }
  }

  /// Retries the whole parse with the input cut off at the offending
  /// token's start, for interactive/partial-input callers. Disables
  /// `truncate` on the retry so a genuinely unparsable prefix still
  /// reports an error instead of looping.
  fn retry_truncated(
    &self,
    root: &Rc<RootNode>,
    bytes: &[u8],
    options: &ParserOptions,
    path: &Option<String>,
    at: &lexlr_core::Point,
  ) -> Option<Result<Root, ParseError>> {
    let _ = path;
    let cut = byte_offset_of_point(root.document().content(), *at);
    if cut == 0 || cut >= bytes.len() {
      return None;
    }
    let retry_options = options.clone().truncate(false);
    let truncated_doc = lexlr_core::Document::create(
      String::from_utf8_lossy(&bytes[..cut]).into_owned(),
      root.document().path().cloned(),
    );
    Some(self.parse(truncated_doc, &retry_options))
  }

  /// Runs the thread-forking walk to completion, returning either the
  /// accepted content node plus its leading/trailing ignored tokens, or the
  /// most informative error.
  fn run(
    &self,
    bytes: &[u8],
    root: &Rc<RootNode>,
    options: &ParserOptions,
    path: &Option<String>,
  ) -> Result<(Ast, Vec<Ast>, Vec<Ast>), ParseError> {
    let mut threads = vec![Thread {
      states:          vec![0],
      syms:            Vec::new(),
      ignored_pending: Vec::new(),
      offset:          options.starting_offset(),
      checked_lazy:    false,
    }];

    let mut accepted: Vec<(Thread, Ast)> = Vec::new();
    let mut worst: Option<(ParseError, usize)> = None;

    // A thread makes strictly forward progress (offset or state-stack
    // length increases) on every non-ignore action; this bound is loose but
    // finite, guarding only against a logic error turning this into an
    // infinite loop.
    let guard = (bytes.len() + 64) * self.syntax.states().len().max(1) + 4096;
    let mut iterations = 0usize;

    while !threads.is_empty() {
      iterations += 1;
      if iterations > guard {
        return Err(ParseError::NoAccept { path: path.clone() });
      }

      let mut next = Vec::new();
      for thread in threads {
        for outcome in self.advance(thread, root, bytes, options) {
          match outcome {
            ThreadOutcome::Active(t) => next.push(t),
            ThreadOutcome::Accepted(t, ast) => accepted.push((t, ast)),
            ThreadOutcome::Dead(err, at) => {
              let keep = worst.as_ref().map(|(_, prev)| at >= *prev).unwrap_or(true);
              if keep {
                worst = Some((err, at));
              }
            }
          }
        }
      }
      threads = next;
    }

    match accepted.len() {
      0 => Err(worst.map(|(e, _)| e).unwrap_or(ParseError::NoAccept { path: path.clone() })),
      1 => {
        let (thread, content) = accepted.into_iter().next().unwrap();
        let (start, end) = content.byte_range().unwrap_or((thread.offset, thread.offset));
        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        for tok in thread.ignored_pending {
          let (offset, _) = tok.byte_range().unwrap_or((0, 0));
          if offset < start {
            prefix.push(tok);
          } else if offset >= end {
            suffix.push(tok);
          }
        }
        Ok((content, prefix, suffix))
      }
      n => Err(ParseError::AmbiguousAccept { path: path.clone(), candidate_count: n }),
    }
  }

  /// Advances `thread` by exactly one grammar action, internally resolving
  /// any number of leading ignored tokens first and forking once per
  /// distinct token the scanner can produce at the current offset.
  fn advance(&self, thread: Thread, root: &Rc<RootNode>, bytes: &[u8], options: &ParserOptions) -> Vec<ThreadOutcome> {
    let mut pending = vec![thread];
    let mut out = Vec::new();

    while let Some(t) = pending.pop() {
      let state = *t.states.last().expect("thread always has a current state");

      if !self.syntax.state(state).externals.is_empty() {
        out.extend(self.dispatch_import(t, root, state, bytes, options));
        continue;
      }

      let contexts = &self.syntax.state(state).contexts;
      let scans = self.scan(contexts, bytes, t.offset);

      if scans.is_empty() {
        out.push(ThreadOutcome::Dead(self.unexpected_token_error(&t, root, state, bytes), t.offset));
        continue;
      }

      for (sym, len) in scans.iter().copied() {
        let mut branch = t.clone();

        if !branch.checked_lazy {
          branch.checked_lazy = true;
          if options.is_lazy() && sym != EOF_TERMINAL && self.syntax.is_ignored(sym) {
            out.push(ThreadOutcome::Dead(
              ParseError::UnexpectedToken {
                path:         root.document().path().map(|p| p.display().to_string()),
                at:           root.document().point_at(branch.offset),
                found:        "leading ignorable token".to_string(),
                found_text:   token_text(bytes, branch.offset, len),
                last_reduced: None,
                expected:     vec!["a non-ignorable token".to_string()],
              },
              branch.offset,
            ));
            continue;
          }
        }

        if sym != EOF_TERMINAL && self.syntax.is_ignored(sym) {
          self.consume_ignored(&mut branch, root, sym, len);
          pending.push(branch);
        } else {
          out.extend(self.dispatch(branch, root, state, sym, len));
        }
      }
    }

    out
  }

  /// Hands a thread sitting in a state with a pending `.import` point off
  /// to the external grammar registered for it under `ParserOptions::syntax`,
  /// rather than scanning this syntax's own lexicon. The external syntax
  /// parses the remainder of the input as its own document starting at the
  /// thread's offset, truncating at whatever token first doesn't belong to
  /// it (typically the host grammar's own continuation); the accepted
  /// sub-tree's byte span becomes this thread's consumed length, and the
  /// sub-tree itself — not a flattened copy of it — is pushed as the child
  /// occupying the import's body position, so callers can still walk into
  /// it with the ordinary `attr`/`children`/`store` surface.
  fn dispatch_import(&self, mut t: Thread, root: &Rc<RootNode>, state: usize, bytes: &[u8], options: &ParserOptions) -> Vec<ThreadOutcome> {
    let parser_state = self.syntax.state(state);
    let sym = *parser_state.externals.iter().next().expect("externals checked non-empty by caller");

    let lang = match self.syntax.imports().get(&sym) {
      Some(lang) => lang.clone(),
      None => return vec![ThreadOutcome::Dead(ParseError::UnknownSymbol { symbol: sym }, t.offset)],
    };

    let imported = match options.imported_syntax(&lang) {
      Some(syntax) => syntax.clone(),
      None => return vec![ThreadOutcome::Dead(ParseError::MissingImport { lang }, t.offset)],
    };

    let sub_document = lexlr_core::Document::create(
      String::from_utf8_lossy(&bytes[t.offset..]).into_owned(),
      root.document().path().cloned(),
    );
    let sub_parser = Parser::new(imported);
    match sub_parser.parse(sub_document, &ParserOptions::new().truncate(true)) {
      Ok(sub_root) => {
        let content = sub_root.content().unwrap_or_else(|| sub_root.as_ast());
        let consumed = content.byte_range().map(|(_, end)| end).unwrap_or(0);
        t.syms.push(content);
        t.offset += consumed;

        match parser_state.shift.get(&sym) {
          Some(&target) => {
            t.states.push(target);
            vec![ThreadOutcome::Active(t)]
          }
          None => vec![ThreadOutcome::Dead(ParseError::UnknownSymbol { symbol: sym }, t.offset)],
        }
      }
      Err(err) => vec![ThreadOutcome::Dead(err, t.offset)],
    }
  }

  fn dispatch(&self, mut t: Thread, root: &Rc<RootNode>, state: usize, sym: SymbolId, len: usize) -> Vec<ThreadOutcome> {
    let parser_state = self.syntax.state(state);

    if let Some(&production) = parser_state.reduce.get(&sym) {
      return match self.reduce(&mut t, root, production) {
        Ok(Some(content)) => vec![ThreadOutcome::Accepted(t, content)],
        Ok(None) => vec![ThreadOutcome::Active(t)],
        Err(err) => vec![ThreadOutcome::Dead(err, t.offset)],
      };
    }

    if let Some(&target) = parser_state.shift.get(&sym) {
      let node = root.make_term(sym, t.offset, len, self.term_attrs(sym));
      t.syms.push(node);
      t.states.push(target);
      t.offset += len;
      return vec![ThreadOutcome::Active(t)];
    }

    let expected = parser_state
      .shift
      .keys()
      .copied()
      .filter(|s| self.syntax.is_terminal(*s))
      .chain(parser_state.reduce.keys().copied())
      .map(|s| self.syntax.name_of(s).to_string())
      .collect();

    vec![ThreadOutcome::Dead(
      ParseError::UnexpectedToken {
        path:         root.document().path().map(|p| p.display().to_string()),
        at:           root.document().point_at(t.offset),
        found:        self.syntax.name_of(sym).to_string(),
        found_text:   token_text(root.document().as_bytes(), t.offset, len),
        last_reduced: t.syms.last().and_then(|a| a.symbol()).map(|s| self.syntax.name_of(s).to_string()),
        expected,
      },
      t.offset,
    )]
  }

  /// Pops `production`'s body off the stack, splices in any ignored tokens
  /// that fall within its span, builds the attribute map (unfold merge or
  /// named append per body symbol), and pushes the resulting `Ntrm`. The
  /// augmented production (id 0, `S' -> Start <EOF>`) is accepted rather
  /// than reduced to a new node: its first child *is* the accepted tree.
  fn reduce(&self, t: &mut Thread, root: &Rc<RootNode>, production: usize) -> Result<Option<Ast>, ParseError> {
    let formula = self.syntax.production(production);
    let n = formula.body.len();

    let new_top = t.states.len().checked_sub(n).ok_or_else(|| ParseError::NoAccept { path: None })?;
    t.states.truncate(new_top);
    let children: Vec<Ast> = t.syms.split_off(t.syms.len() - n);

    if production == 0 {
      let content = children.into_iter().next().ok_or(ParseError::NoAccept { path: None })?;
      return Ok(Some(content));
    }

    let start_offset = children.iter().find_map(|c| c.byte_range()).map(|(s, _)| s);
    let end_offset = children.iter().rev().find_map(|c| c.byte_range()).map(|(_, e)| e);

    let splice = match (start_offset, end_offset) {
      (Some(start), Some(end)) => {
        let mut matched = Vec::new();
        let mut remaining = Vec::new();
        for tok in t.ignored_pending.drain(..) {
          let (offset, _) = tok.byte_range().unwrap_or((0, 0));
          if offset >= start && offset < end {
            matched.push(tok);
          } else {
            remaining.push(tok);
          }
        }
        t.ignored_pending = remaining;
        matched
      }
      _ => Vec::new(),
    };

    let sentence = merge_by_offset(children.clone(), splice);

    let mut attributes: BTreeMap<String, Vec<Ast>> = BTreeMap::new();
    for (bs, child) in formula.body.iter().zip(children.into_iter()) {
      match bs.attr.as_deref() {
        None => {}
        Some("...") => {
          if let Ast::Ntrm(node) = &child {
            for (name, values) in &node.attributes {
              attributes.entry(name.clone()).or_default().extend(values.iter().cloned());
            }
          }
        }
        Some(name) => {
          attributes.entry(name.to_string()).or_default().push(child);
        }
      }
    }

    let node = root.make_ntrm(formula.head, production, sentence, attributes);

    let goto_state = *t.states.last().expect("thread always has a current state");
    let next_state = *self
      .syntax
      .state(goto_state)
      .shift
      .get(&formula.head)
      .ok_or(ParseError::UnknownSymbol { symbol: formula.head })?;
    t.syms.push(node);
    t.states.push(next_state);
    Ok(None)
  }

  fn consume_ignored(&self, t: &mut Thread, root: &Rc<RootNode>, sym: SymbolId, len: usize) {
    let node = root.make_term(sym, t.offset, len, self.term_attrs(sym));
    t.ignored_pending.push(node);
    t.offset += len;
  }

  fn term_attrs(&self, sym: SymbolId) -> BTreeMap<String, Value> {
    self.syntax.lex().term(sym).map(|t| t.attrs.clone()).unwrap_or_default()
  }

  /// Scans the input at `offset` under every context `state`'s legal next
  /// terminals could come from, returning the distinct `(symbol, length)`
  /// results. More than one distinct result means two contexts disagree on
  /// what the bytes at `offset` mean — the caller forks one thread per
  /// result. End of input always scans as a single, unambiguous zero-length
  /// `<EOF>`.
  fn scan(&self, contexts: &std::collections::BTreeSet<ContextId>, bytes: &[u8], offset: usize) -> Vec<(SymbolId, usize)> {
    if offset >= bytes.len() {
      return vec![(EOF_TERMINAL, 0)];
    }
    let lex = self.syntax.lex();
    let mut out: Vec<(SymbolId, usize)> = Vec::new();
    let ctxs: &[ContextId] = if contexts.is_empty() { &[DEFAULT_CONTEXT] } else { &[] };
    for ctx in contexts.iter().copied().chain(ctxs.iter().copied()) {
      if let Some(tok) = scan_token(lex, ctx, bytes, offset) {
        if !out.contains(&tok) {
          out.push(tok);
        }
      }
    }
    out
  }

  fn unexpected_token_error(&self, t: &Thread, root: &Rc<RootNode>, state: usize, bytes: &[u8]) -> ParseError {
    let parser_state = self.syntax.state(state);
    let expected = parser_state
      .shift
      .keys()
      .copied()
      .filter(|s| self.syntax.is_terminal(*s))
      .chain(parser_state.reduce.keys().copied())
      .map(|s| self.syntax.name_of(s).to_string())
      .collect();
    ParseError::UnexpectedToken {
      path:         root.document().path().map(|p| p.display().to_string()),
      at:           root.document().point_at(t.offset),
      found:        "<unrecognized input>".to_string(),
      found_text:   token_text(bytes, t.offset, 1),
      last_reduced: t.syms.last().and_then(|a| a.symbol()).map(|s| self.syntax.name_of(s).to_string()),
      expected,
    }
  }
}

fn scan_token(lex: &Lex, context: ContextId, bytes: &[u8], offset: usize) -> Option<(SymbolId, usize)> {
  let mut state = lex.start_state(context);
  let mut len = 0usize;
  loop {
    if offset + len >= bytes.len() {
      let accept = lex.states()[state].accepts;
      return accept.map(|a| (a, len)).filter(|(_, l)| *l > 0);
    }
    let byte = bytes[offset + len];
    match lex.states()[state].transitions.get(&byte) {
      Some(next) => {
        state = *next;
        len += 1;
      }
      None => {
        let accept = lex.states()[state].accepts;
        return accept.map(|a| (a, len)).filter(|(_, l)| *l > 0);
      }
    }
  }
}

fn token_text(bytes: &[u8], offset: usize, len: usize) -> String {
  let end = (offset + len).min(bytes.len());
  let start = offset.min(end);
  String::from_utf8_lossy(&bytes[start..end]).into_owned()
}

/// Merges two source-order sequences keyed by each node's starting byte
/// offset. Used to reinsert ignored tokens that fall within a reduced
/// node's span without disturbing the left-to-right order of its real
/// children. A child with no byte range (a fully empty, nullable
/// reduction) sorts before any ignored token still pending at that point.
fn merge_by_offset(children: Vec<Ast>, ignored: Vec<Ast>) -> Vec<Ast> {
  if ignored.is_empty() {
    return children;
  }
  let mut out = Vec::with_capacity(children.len() + ignored.len());
  let mut ignored = ignored.into_iter().peekable();
  for child in children {
    let child_offset = child.byte_range().map(|(s, _)| s);
    while let Some(peek_offset) = ignored.peek().and_then(|tok| tok.byte_range()).map(|(s, _)| s) {
      if child_offset.map(|co| peek_offset <= co).unwrap_or(true) {
        out.push(ignored.next().unwrap());
      } else {
        break;
      }
    }
    out.push(child);
  }
  out.extend(ignored);
  out
}

fn byte_offset_of_point(content: &str, at: lexlr_core::Point) -> usize {
  let mut line = 1usize;
  let mut column = 1usize;
  for (idx, b) in content.as_bytes().iter().enumerate() {
    if line == at.line && column == at.column {
      return idx;
    }
    if *b == b'\n' {
      line += 1;
      column = 1;
    } else if b & 0b1100_0000 != 0b1000_0000 {
      column += 1;
    }
  }
  content.len()
}
