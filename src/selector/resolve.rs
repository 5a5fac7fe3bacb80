//! Resolving parent references and unifying compound selectors.

use crate::error::ScriptError;
use crate::selector::{
    ComplexComponent, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};

impl SelectorList {
    /// Resolves `&` references against the enclosing style rule's selector.
    ///
    /// When `implicit_parent` is set, complex selectors that do not mention
    /// `&` are still nested under the parent (the normal nesting rule);
    /// `@at-root` turns that off.
    pub fn resolve_parent_selectors(
        &self,
        parent: Option<&SelectorList>,
        implicit_parent: bool,
    ) -> Result<SelectorList, ScriptError> {
        let parent = match parent {
            Some(parent) => parent,
            None => {
                if self.contains_parent() {
                    return Err(ScriptError::new(
                        "Top-level selectors may not contain the parent selector \"&\".",
                    ));
                }
                return Ok(self.clone());
            }
        };

        let mut resolved = Vec::new();
        for complex in &self.components {
            if !complex.contains_parent() {
                if !implicit_parent {
                    resolved.push(complex.clone());
                    continue;
                }
                for parent_complex in &parent.components {
                    let mut components = parent_complex.components.clone();
                    components.extend(complex.components.iter().cloned());
                    resolved.push(ComplexSelector::new(components));
                }
                continue;
            }

            for parent_complex in &parent.components {
                resolved.push(complex.substitute_parent(parent_complex)?);
            }
        }

        Ok(SelectorList::new(resolved))
    }
}

impl ComplexSelector {
    /// Replaces `&` references in this selector with `parent`.
    fn substitute_parent(&self, parent: &ComplexSelector) -> Result<ComplexSelector, ScriptError> {
        let mut components = Vec::new();

        for component in &self.components {
            let compound = match component {
                ComplexComponent::Combinator(_) => {
                    components.push(component.clone());
                    continue;
                }
                ComplexComponent::Compound(compound) => compound,
            };

            let parent_position = compound
                .components
                .iter()
                .position(|s| matches!(s, SimpleSelector::Parent { .. }));

            let position = match parent_position {
                None => {
                    components.push(component.clone());
                    continue;
                }
                Some(0) => 0,
                Some(_) => {
                    return Err(ScriptError::new(
                        "\"&\" may only be used at the beginning of a compound selector.",
                    ));
                }
            };

            let suffix = match &compound.components[position] {
                SimpleSelector::Parent { suffix } => suffix.clone(),
                _ => unreachable!("position() found a parent selector here"),
            };

            // Splice the parent's components in place of the `&`, merging
            // its last compound with whatever follows the `&`.
            let last = parent
                .last_compound()
                .ok_or_else(|| ScriptError::new("Parent selector has no compound selector."))?;

            let mut merged = last.components.clone();
            if let Some(suffix) = suffix {
                let simple = merged
                    .pop()
                    .ok_or_else(|| ScriptError::new("Parent selector is empty."))?;
                merged.push(apply_suffix(simple, &suffix)?);
            }
            merged.extend(compound.components[position + 1..].iter().cloned());

            let leading = parent.components.len() - 1;
            components.extend(parent.components[..leading].iter().cloned());
            components.push(ComplexComponent::Compound(CompoundSelector::new(merged)));
        }

        Ok(ComplexSelector::new(components))
    }
}

fn apply_suffix(simple: SimpleSelector, suffix: &str) -> Result<SimpleSelector, ScriptError> {
    match simple {
        SimpleSelector::Type(name) => Ok(SimpleSelector::Type(format!("{}{}", name, suffix))),
        SimpleSelector::Id(name) => Ok(SimpleSelector::Id(format!("{}{}", name, suffix))),
        SimpleSelector::Class(name) => Ok(SimpleSelector::Class(format!("{}{}", name, suffix))),
        SimpleSelector::Placeholder(name) => {
            Ok(SimpleSelector::Placeholder(format!("{}{}", name, suffix)))
        }
        SimpleSelector::Pseudo {
            name,
            element,
            argument: None,
        } => Ok(SimpleSelector::Pseudo {
            name: format!("{}{}", name, suffix),
            element,
            argument: None,
        }),
        other => Err(ScriptError::new(format!(
            "Parent \"{}\" is incompatible with this selector.",
            other
        ))),
    }
}

/// Merges two compound selectors into one matching both, or `None` when
/// they cannot both match one element (two different ids, two different
/// element types).
pub fn unify_compounds(
    a: &CompoundSelector,
    b: &CompoundSelector,
) -> Option<CompoundSelector> {
    let mut components = a.components.clone();

    for simple in &b.components {
        if components.contains(simple) {
            continue;
        }
        match simple {
            SimpleSelector::Type(name) => {
                if components
                    .iter()
                    .any(|s| matches!(s, SimpleSelector::Type(n) if n != name))
                {
                    return None;
                }
                // element type goes first in a compound
                components.insert(0, simple.clone());
            }
            SimpleSelector::Id(name) => {
                if components
                    .iter()
                    .any(|s| matches!(s, SimpleSelector::Id(n) if n != name))
                {
                    return None;
                }
                components.push(simple.clone());
            }
            SimpleSelector::Universal => {
                // `*` adds nothing to an existing compound
                if components.is_empty() {
                    components.push(SimpleSelector::Universal);
                }
            }
            _ => components.push(simple.clone()),
        }
    }

    Some(CompoundSelector::new(components))
}
