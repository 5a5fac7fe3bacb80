//! The `@extend` engine.
//!
//! Style rules register their selectors here as they are emitted; `@extend`
//! rules register extensions.  Because an extension can arrive before or
//! after the selectors it affects, nothing is rewritten eagerly: the
//! extender records everything and [`Extender::finalize`] recomputes each
//! tracked selector from its original form plus the applicable extensions.
//! The rewrite happens through the selector handle shared with the CSS
//! tree, so `@media`-split copies of a rule see it too.
//!
//! Ordering: the output selector list preserves source order.  A selector
//! produced by an extension that was registered *before* the extended rule
//! is inserted before the original complex selector; one registered after
//! is appended after it.

use std::cell::RefCell;
use std::rc::Rc;

use codemap::Span;

use crate::media::MediaQuery;
use crate::selector::resolve::unify_compounds;
use crate::selector::{
    ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};

/// A registered `@extend`.
#[derive(Debug, Clone)]
pub struct Extension {
    /// The selector of the rule containing the `@extend`.
    pub extender: SelectorList,
    /// The simple selector being extended.
    pub target: SimpleSelector,
    /// The span of the `@extend` rule, for error reporting.
    pub span: Span,
    /// Media queries in force where the `@extend` appeared.
    pub media: Vec<MediaQuery>,
    /// `!optional`: no error when the target never appears.
    pub optional: bool,
    order: usize,
}

struct TrackedSelector {
    handle: Rc<RefCell<SelectorList>>,
    original: SelectorList,
    media: Vec<MediaQuery>,
    order: usize,
}

/// Per-module extension state.
#[derive(Default)]
pub struct Extender {
    selectors: Vec<TrackedSelector>,
    extensions: Vec<Extension>,
    next_order: usize,
}

impl Extender {
    pub fn new() -> Extender {
        Extender::default()
    }

    /// Whether any extensions have been registered.
    pub fn has_extensions(&self) -> bool {
        !self.extensions.is_empty()
    }

    /// Starts tracking a style rule's selector.  The returned handle is the
    /// one the rule's CSS node holds; `finalize` rewrites it in place.
    pub fn add_selector(
        &mut self,
        handle: Rc<RefCell<SelectorList>>,
        media: Vec<MediaQuery>,
    ) -> Rc<RefCell<SelectorList>> {
        let original = handle.borrow().clone();
        let order = self.bump_order();
        self.selectors.push(TrackedSelector {
            handle: Rc::clone(&handle),
            original,
            media,
            order,
        });
        handle
    }

    /// Registers an `@extend` from `extender` onto `target`.
    pub fn add_extension(
        &mut self,
        extender: SelectorList,
        target: &SimpleSelector,
        span: Span,
        media: Vec<MediaQuery>,
        optional: bool,
    ) {
        let order = self.bump_order();
        self.extensions.push(Extension {
            extender,
            target: target.clone(),
            span,
            media,
            optional,
            order,
        });
    }

    /// The registered extensions whose target satisfies `pred`.
    pub fn extensions_where_target(
        &self,
        mut pred: impl FnMut(&SimpleSelector) -> bool,
    ) -> impl Iterator<Item = &Extension> {
        let matching: Vec<usize> = self
            .extensions
            .iter()
            .enumerate()
            .filter(|(_, e)| pred(&e.target))
            .map(|(i, _)| i)
            .collect();
        matching.into_iter().map(move |i| &self.extensions[i])
    }

    /// Whether any tracked selector's compounds contain `target`.
    pub fn is_satisfied(&self, extension: &Extension) -> bool {
        self.selectors
            .iter()
            .any(|tracked| tracked.original.simple_selectors().any(|s| *s == extension.target))
    }

    /// Pulls in a downstream module's extensions during composition, so
    /// they apply to this module's selectors as well.
    pub fn add_extensions(&mut self, downstream: &Extender) {
        for extension in &downstream.extensions {
            let order = self.bump_order();
            self.extensions.push(Extension {
                order,
                ..extension.clone()
            });
        }
    }

    /// Takes over another extender's entire state: tracked selectors and
    /// extensions, in their original relative order.  Used when a module's
    /// CSS is spliced inline by a legacy `@import`.
    pub fn absorb(&mut self, other: &Extender) {
        let base = self.next_order;
        for tracked in &other.selectors {
            self.selectors.push(TrackedSelector {
                handle: Rc::clone(&tracked.handle),
                original: tracked.original.clone(),
                media: tracked.media.clone(),
                order: base + tracked.order,
            });
        }
        for extension in &other.extensions {
            self.extensions.push(Extension {
                order: base + extension.order,
                ..extension.clone()
            });
        }
        self.next_order = base + other.next_order;
    }

    /// Rewrites every tracked selector to its extended form.  Idempotent:
    /// each selector is recomputed from its original.
    pub fn finalize(&mut self) {
        // A pass per extension reaches the fixpoint of chained extends
        // (`.c { @extend .a } .a { @extend .b }`).
        let passes = self.extensions.len() + 1;

        for tracked in &self.selectors {
            let mut current = tracked.original.clone();
            for _ in 0..passes {
                let next = apply_extensions(
                    &current,
                    &self.extensions,
                    &tracked.media,
                    tracked.order,
                );
                if next == current {
                    break;
                }
                current = next;
            }
            *tracked.handle.borrow_mut() = current;
        }
    }

    fn bump_order(&mut self) -> usize {
        let order = self.next_order;
        self.next_order += 1;
        order
    }
}

fn apply_extensions(
    list: &SelectorList,
    extensions: &[Extension],
    media: &[MediaQuery],
    rule_order: usize,
) -> SelectorList {
    let mut result: Vec<ComplexSelector> = Vec::new();

    for complex in &list.components {
        let mut before: Vec<ComplexSelector> = Vec::new();
        let mut after: Vec<ComplexSelector> = Vec::new();

        for extension in extensions {
            if extension.media != media {
                continue;
            }
            for new_complex in extend_complex(complex, extension) {
                if new_complex == *complex {
                    continue;
                }
                let bucket = if extension.order < rule_order {
                    &mut before
                } else {
                    &mut after
                };
                if !bucket.contains(&new_complex) {
                    bucket.push(new_complex);
                }
            }
        }

        for c in before {
            push_unique(&mut result, c);
        }
        push_unique(&mut result, complex.clone());
        for c in after {
            push_unique(&mut result, c);
        }
    }

    SelectorList::new(result)
}

fn push_unique(list: &mut Vec<ComplexSelector>, complex: ComplexSelector) {
    if !list.contains(&complex) {
        list.push(complex);
    }
}

/// All selectors produced by substituting `extension` into one complex
/// selector, one per occurrence of the target per extending complex.
fn extend_complex(complex: &ComplexSelector, extension: &Extension) -> Vec<ComplexSelector> {
    let mut results = Vec::new();

    for (position, component) in complex.components.iter().enumerate() {
        let compound = match component {
            ComplexComponent::Compound(compound) => compound,
            ComplexComponent::Combinator(_) => continue,
        };
        if !compound.contains(&extension.target) {
            continue;
        }

        // the compound with the target removed
        let rest = CompoundSelector::new(
            compound
                .components
                .iter()
                .filter(|s| **s != extension.target)
                .cloned()
                .collect(),
        );

        for ext_complex in &extension.extender.components {
            let last = match ext_complex.last_compound() {
                Some(last) => last,
                None => continue,
            };
            let merged = match unify_compounds(last, &rest) {
                Some(merged) => merged,
                None => continue,
            };

            let mut components = Vec::new();
            components.extend(complex.components[..position].iter().cloned());
            let leading = ext_complex.components.len() - 1;
            components.extend(ext_complex.components[..leading].iter().cloned());
            components.push(ComplexComponent::Compound(merged));
            components.extend(complex.components[position + 1..].iter().cloned());

            results.push(ComplexSelector::new(components));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parser::parse_selector_list;

    fn span() -> Span {
        let mut map = codemap::CodeMap::new();
        map.add_file("t.scss".into(), "x".into()).span
    }

    fn list(text: &str) -> SelectorList {
        parse_selector_list(text, true).unwrap()
    }

    fn simple(text: &str) -> SimpleSelector {
        list(text).components[0].last_compound().unwrap().components[0].clone()
    }

    fn handle(text: &str) -> Rc<RefCell<SelectorList>> {
        Rc::new(RefCell::new(list(text)))
    }

    #[test]
    fn extension_before_rule_prepends() {
        // .a { @extend .b }  .b { ... }  =>  .a, .b
        let mut extender = Extender::new();
        extender.add_extension(list(".a"), &simple(".b"), span(), vec![], false);
        let h = extender.add_selector(handle(".b"), vec![]);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), ".a, .b");
    }

    #[test]
    fn extension_after_rule_appends() {
        // .error { ... }  .error--serious { @extend .error }
        let mut extender = Extender::new();
        let h = extender.add_selector(handle(".error"), vec![]);
        extender.add_extension(list(".error--serious"), &simple(".error"), span(), vec![], false);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), ".error, .error--serious");
    }

    #[test]
    fn extension_preserves_surrounding_compound() {
        let mut extender = Extender::new();
        let h = extender.add_selector(handle(".b:hover"), vec![]);
        extender.add_extension(list(".a"), &simple(".b"), span(), vec![], false);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), ".b:hover, .a:hover");
    }

    #[test]
    fn extension_into_complex_context() {
        let mut extender = Extender::new();
        let h = extender.add_selector(handle("ul .b"), vec![]);
        extender.add_extension(list(".a > .c"), &simple(".b"), span(), vec![], false);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), "ul .b, ul .a > .c");
    }

    #[test]
    fn chained_extends_reach_fixpoint() {
        // .c extends .a, .a extends .b => .b's rule gains .a and .c
        let mut extender = Extender::new();
        let h = extender.add_selector(handle(".b"), vec![]);
        extender.add_extension(list(".a"), &simple(".b"), span(), vec![], false);
        extender.add_extension(list(".c"), &simple(".a"), span(), vec![], false);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), ".b, .a, .c");
    }

    #[test]
    fn media_scope_gates_application() {
        let screen = crate::media::parse_media_query_list("screen").unwrap();
        let mut extender = Extender::new();
        let h = extender.add_selector(handle(".b"), vec![]);
        extender.add_extension(list(".a"), &simple(".b"), span(), screen, false);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), ".b");
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut extender = Extender::new();
        let h = extender.add_selector(handle(".b"), vec![]);
        extender.add_extension(list(".a"), &simple(".b"), span(), vec![], false);
        extender.finalize();
        extender.finalize();
        assert_eq!(h.borrow().to_string(), ".b, .a");
    }

    #[test]
    fn satisfaction_and_queries() {
        let mut extender = Extender::new();
        extender.add_selector(handle(".b"), vec![]);
        extender.add_extension(list(".a"), &simple(".b"), span(), vec![], false);
        extender.add_extension(list(".x"), &simple(".missing"), span(), vec![], true);

        let exts: Vec<_> = extender
            .extensions_where_target(|t| *t == simple(".missing"))
            .collect();
        assert_eq!(exts.len(), 1);
        assert!(exts[0].optional);

        let satisfied: Vec<_> = extender
            .extensions
            .iter()
            .map(|e| extender.is_satisfied(e))
            .collect();
        assert_eq!(satisfied, vec![true, false]);
    }

    #[test]
    fn conflicting_unification_produces_nothing() {
        let mut extender = Extender::new();
        let h = extender.add_selector(handle("#x.b"), vec![]);
        extender.add_extension(list("#y"), &simple(".b"), span(), vec![], false);
        extender.finalize();
        assert_eq!(h.borrow().to_string(), "#x.b");
    }
}
