//! The attributed AST: `Term` leaves, `Ntrm` interior nodes, and the
//! distinguished `Root` that owns the source document and the syntax a
//! tree was parsed against.
//!
//! Every node holds a weak back-reference to its `Root` (never a strong
//! cycle): `Root` is allocated first via `Rc::new_cyclic` and acts as the
//! factory for every node the parser subsequently builds, so by
//! construction nothing downstream can outlive the tree it belongs to
//! without the `Root`'s cooperation, yet dropping the `Root` still frees
//! everything cleanly.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use lexlr_core::{Document, Point, SymbolId};
use lexlr_skeleton::Skeleton;
use lexlr_syntax::Syntax;
use serde_json::{json, Value};

/// A terminal leaf: a matched span of source text plus the attributes
/// copied from its terminal definition at scan time.
#[derive(Debug)]
pub struct TermNode {
  pub symbol: SymbolId,
  pub offset: usize,
  pub length: usize,
  pub attrs:  BTreeMap<String, Value>,
  root:       Weak<RootNode>,
}

/// A non-terminal interior node: the ordered `sentence` it reduced from
/// (including any ignored terminals reinserted at their original offsets)
/// and the attribute map built up across that reduction.
#[derive(Debug)]
pub struct NtrmNode {
  pub symbol:     SymbolId,
  pub production: usize,
  pub sentence:   Vec<Ast>,
  pub attributes: BTreeMap<String, Vec<Ast>>,
  root:           Weak<RootNode>,
}

/// The tree owner: the source document, the syntax the tree was parsed
/// against, and the accepted content node plus any ignored tokens at the
/// very start or end of the source that fall outside every reduction.
#[derive(Debug)]
pub struct RootNode {
  document: Document,
  syntax:   Arc<Syntax>,
  content:  RefCell<Option<Ast>>,
  prefix:   RefCell<Vec<Ast>>,
  suffix:   RefCell<Vec<Ast>>,
  self_ref: Weak<RootNode>,
}

/// The three AST node variants. Cheap to clone (an `Rc` bump).
#[derive(Clone, Debug)]
pub enum Ast {
  Term(Rc<TermNode>),
  Ntrm(Rc<NtrmNode>),
  Root(Rc<RootNode>),
}

impl RootNode {
  /// Allocates an empty root over `document`/`syntax`. Used by
  /// [`crate::Parser`] as the factory for every node it builds; callers
  /// outside the parser should not normally construct a `RootNode`
  /// directly.
  pub fn new(document: Document, syntax: Arc<Syntax>) -> Rc<RootNode> {
    Rc::new_cyclic(|weak| RootNode {
      document,
      syntax,
      content: RefCell::new(None),
      prefix: RefCell::new(Vec::new()),
      suffix: RefCell::new(Vec::new()),
      self_ref: weak.clone(),
    })
  }

  pub fn make_term(self: &Rc<Self>, symbol: SymbolId, offset: usize, length: usize, attrs: BTreeMap<String, Value>) -> Ast {
    Ast::Term(Rc::new(TermNode { symbol, offset, length, attrs, root: self.self_ref.clone() }))
  }

  pub fn make_ntrm(
    self: &Rc<Self>,
    symbol: SymbolId,
    production: usize,
    sentence: Vec<Ast>,
    attributes: BTreeMap<String, Vec<Ast>>,
  ) -> Ast {
    Ast::Ntrm(Rc::new(NtrmNode { symbol, production, sentence, attributes, root: self.self_ref.clone() }))
  }

  /// Installs the single accepted top-level node plus the ignored tokens
  /// that fall strictly before or after it in the source.
  pub fn finalize(&self, content: Ast, prefix: Vec<Ast>, suffix: Vec<Ast>) {
    *self.content.borrow_mut() = Some(content);
    *self.prefix.borrow_mut() = prefix;
    *self.suffix.borrow_mut() = suffix;
  }

  pub fn document(&self) -> &Document {
    &self.document
  }

  pub fn syntax(&self) -> &Arc<Syntax> {
    &self.syntax
  }

  pub fn content(&self) -> Option<Ast> {
    self.content.borrow().clone()
  }

  /// The root's own `sentence`: any leading ignored tokens, then the
  /// accepted content node, then any trailing ignored tokens.
  pub fn sentence(&self) -> Vec<Ast> {
    let mut out = self.prefix.borrow().clone();
    if let Some(content) = self.content() {
      out.push(content);
    }
    out.extend(self.suffix.borrow().iter().cloned());
    out
  }

  fn as_ast(self: &Rc<Self>) -> Ast {
    Ast::Root(self.clone())
  }
}

/// Options controlling [`Ast::store`]'s rendering.
#[derive(Clone, Copy, Default)]
pub struct StoreOptions<'s> {
  /// When set, `store` consults it to decide whether a single-child
  /// attribute renders as a scalar or (consistently) as a one-element list.
  pub skeleton: Option<&'s Skeleton>,
  /// Render terminals as a small object (symbol name + text) instead of
  /// collapsing them to their bare source text.
  pub unfold:   bool,
  /// Splice a child's rendered list directly into the parent's instead of
  /// nesting it, when that child's own rendering is itself a list.
  pub flatten:  bool,
  /// Render only the attribute map (plus a few metadata keys) instead of
  /// the full sentence.
  pub compact:  bool,
}

impl Ast {
  fn root_weak(&self) -> &Weak<RootNode> {
    match self {
      Ast::Term(t) => &t.root,
      Ast::Ntrm(n) => &n.root,
      Ast::Root(r) => &r.self_ref,
    }
  }

  /// The owning [`RootNode`], if it has not been dropped.
  pub fn root(&self) -> Option<Rc<RootNode>> {
    self.root_weak().upgrade()
  }

  pub fn symbol(&self) -> Option<SymbolId> {
    match self {
      Ast::Term(t) => Some(t.symbol),
      Ast::Ntrm(n) => Some(n.symbol),
      Ast::Root(r) => r.content().and_then(|c| c.symbol()),
    }
  }

  /// The node's own children in source order — a `Term`'s is empty, a
  /// `Ntrm`'s is its `sentence`, a `Root`'s is its own synthesized
  /// sentence (ignored prefix/suffix plus content).
  pub fn children(&self) -> Vec<Ast> {
    match self {
      Ast::Term(_) => Vec::new(),
      Ast::Ntrm(n) => n.sentence.clone(),
      Ast::Root(r) => r.sentence(),
    }
  }

  /// The leftmost `Term` leaf reachable from this node.
  pub fn first_term(&self) -> Option<Ast> {
    match self {
      Ast::Term(_) => Some(self.clone()),
      Ast::Ntrm(n) => n.sentence.iter().find_map(|c| c.first_term()),
      Ast::Root(r) => r.sentence().iter().find_map(|c| c.first_term()),
    }
  }

  /// The rightmost `Term` leaf reachable from this node.
  pub fn last_term(&self) -> Option<Ast> {
    match self {
      Ast::Term(_) => Some(self.clone()),
      Ast::Ntrm(n) => n.sentence.iter().rev().find_map(|c| c.last_term()),
      Ast::Root(r) => r.sentence().iter().rev().find_map(|c| c.last_term()),
    }
  }

  /// Byte span `[start, end)` this node covers, derived from its first and
  /// last terminal. `None` for a node with no terminal descendants at all
  /// (an empty, nullable reduction).
  pub fn byte_range(&self) -> Option<(usize, usize)> {
    if let Ast::Term(t) = self {
      return Some((t.offset, t.offset + t.length));
    }
    let first = self.first_term()?;
    let last = self.last_term()?;
    let (start, _) = first.byte_range()?;
    let (_, end) = last.byte_range()?;
    Some((start, end))
  }

  /// `(start, end)` as one-indexed `{line, column}` pairs, via the owning
  /// document's newline/UTF-8 scan.
  pub fn range(&self) -> Option<(Point, Point)> {
    let (start, end) = self.byte_range()?;
    let root = self.root()?;
    Some((root.document().point_at(start), root.document().point_at(end)))
  }

  /// The exact source substring this node spans.
  pub fn text(&self) -> Option<String> {
    let (start, end) = self.byte_range()?;
    let root = self.root()?;
    Some(root.document().slice(start, end).to_string())
  }

  /// First value stored under `attr`, if any.
  pub fn attr(&self, attr: &str) -> Option<Ast> {
    self.attrs(attr).into_iter().next()
  }

  /// Every value stored under `attr`, in assignment order.
  pub fn attrs(&self, attr: &str) -> Vec<Ast> {
    match self {
      Ast::Ntrm(n) => n.attributes.get(attr).cloned().unwrap_or_default(),
      Ast::Root(r) => r.content().map(|c| c.attrs(attr)).unwrap_or_default(),
      Ast::Term(_) => Vec::new(),
    }
  }

  pub fn attribute_names(&self) -> Vec<String> {
    match self {
      Ast::Ntrm(n) => n.attributes.keys().cloned().collect(),
      Ast::Root(r) => r.content().map(|c| c.attribute_names()).unwrap_or_default(),
      Ast::Term(_) => Vec::new(),
    }
  }

  /// The production id this node reduced from, if it is a `Ntrm` (or the
  /// `Ntrm` a `Root` wraps).
  pub fn production(&self) -> Option<usize> {
    match self {
      Ast::Ntrm(n) => Some(n.production),
      Ast::Root(r) => r.content().and_then(|c| c.production()),
      Ast::Term(_) => None,
    }
  }

  /// Walks through a chain of unfolded productions (single body symbol,
  /// `attr = "..."`) to find the "meaningful" production id: the first one
  /// down the unfold chain that is not itself unfolded, or the last one in
  /// the chain if every link is unfolded.
  pub fn origin_formula(&self) -> Option<usize> {
    let root = self.root()?;
    let syntax = root.syntax();
    let mut current = self.clone();
    loop {
      let production = current.production()?;
      let formula = syntax.production(production);
      if !formula.is_unfolded() {
        return Some(production);
      }
      let Some(only_child) = current.children().into_iter().next() else {
        return Some(production);
      };
      if only_child.production().is_none() {
        return Some(production);
      }
      current = only_child;
    }
  }

  /// Renders this node to a structured [`Value`] per `opts`. Terminals
  /// collapse to their source text unless `opts.unfold`; non-terminals
  /// render their attribute map (and, unless `opts.compact`, their full
  /// literal sentence).
  pub fn store(&self, opts: &StoreOptions) -> Value {
    match self {
      Ast::Term(t) => {
        if opts.unfold {
          json!({
            "symbol": t.symbol,
            "text": self.text(),
          })
        } else {
          json!(self.text())
        }
      }
      Ast::Ntrm(n) => self.store_ntrm(n, opts),
      Ast::Root(r) => match r.content() {
        Some(content) => content.store(opts),
        None => Value::Null,
      },
    }
  }

  fn store_ntrm(&self, n: &NtrmNode, opts: &StoreOptions) -> Value {
    let mut obj = serde_json::Map::new();

    if !opts.compact {
      let sentence: Vec<Value> = n.sentence.iter().map(|c| c.store(opts)).collect();
      obj.insert("sentence".to_string(), Value::Array(sentence));
    } else {
      obj.insert("symbol".to_string(), json!(n.symbol));
      obj.insert("formula".to_string(), json!(n.production));
      if let Some(origin) = self.origin_formula() {
        obj.insert("origin".to_string(), json!(origin));
      }
    }

    for (name, values) in &n.attributes {
      let single = opts
        .skeleton
        .map(|sk| sk.is_single_valued(n.symbol, name))
        .unwrap_or(values.len() == 1);

      let mut rendered: Vec<Value> = Vec::new();
      for v in values {
        let value = v.store(opts);
        if opts.flatten {
          if let Value::Array(items) = &value {
            if matches!(v, Ast::Ntrm(_) | Ast::Root(_)) {
              rendered.extend(items.iter().cloned());
              continue;
            }
          }
        }
        rendered.push(value);
      }

      let rendered_value = if single && rendered.len() <= 1 {
        rendered.into_iter().next().unwrap_or(Value::Null)
      } else {
        Value::Array(rendered)
      };
      obj.insert(name.clone(), rendered_value);
    }

    Value::Object(obj)
  }
}

impl std::fmt::Debug for StoreOptions<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StoreOptions")
      .field("unfold", &self.unfold)
      .field("flatten", &self.flatten)
      .field("compact", &self.compact)
      .field("skeleton", &self.skeleton.is_some())
      .finish()
  }
}

/// A thin handle to a parsed tree's owner, returned by
/// [`crate::Parser::parse`]. Cloning shares the same underlying tree.
#[derive(Clone, Debug)]
pub struct Root(Rc<RootNode>);

impl Root {
  pub(crate) fn new(inner: Rc<RootNode>) -> Self {
    Self(inner)
  }

  pub(crate) fn inner(&self) -> &Rc<RootNode> {
    &self.0
  }

  pub fn as_ast(&self) -> Ast {
    self.0.as_ast()
  }

  pub fn document(&self) -> &Document {
    self.0.document()
  }

  pub fn syntax(&self) -> &Arc<Syntax> {
    self.0.syntax()
  }

  /// The single top-level accepted node (production 0's `Ntrm`), without
  /// the reattached leading/trailing ignored tokens `Ast::Root::children`
  /// would include.
  pub fn content(&self) -> Option<Ast> {
    self.0.content()
  }

  pub fn store(&self, opts: &StoreOptions) -> Value {
    self.as_ast().store(opts)
  }
}
