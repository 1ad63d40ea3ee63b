//! Stream rendering over the binding IR.

use super::ir::*;

/// One output stream. Every hook renders a complete unit: any block it
/// opens is closed before it returns.
pub trait StreamRenderer {
    fn preamble(&mut self, ir: &BindingIr);

    fn section(&mut self, _section: Section) {}

    fn handle_type(&mut self, _binding: &HandleTypeBinding) {}

    fn constant(&mut self, _binding: &ConstBinding) {}

    fn variable(&mut self, _binding: &VarBinding) {}

    fn class(&mut self, _binding: &ClassBinding) {}

    fn call(&mut self, _binding: &CallBinding) {}

    fn postamble(&mut self, _ir: &BindingIr) {}

    fn finish(self) -> String
    where
        Self: Sized;
}

/// Walks the IR once, in order, through `renderer`.
pub fn render<R: StreamRenderer>(ir: &BindingIr, mut renderer: R) -> String {
    renderer.preamble(ir);
    for item in &ir.items {
        match item {
            BindingItem::Section(section) => renderer.section(*section),
            BindingItem::HandleType(binding) => renderer.handle_type(binding),
            BindingItem::Constant(binding) => renderer.constant(binding),
            BindingItem::Variable(binding) => renderer.variable(binding),
            BindingItem::Class(binding) => renderer.class(binding),
            BindingItem::Call(binding) => renderer.call(binding),
        }
    }
    renderer.postamble(ir);
    renderer.finish()
}

/// Substitutes `{key}` placeholders in a fixed template. Braces that do not
/// name a known key are copied through, so templates may contain literal
/// braces (dict literals, Rust blocks).
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let substituted = if after[key_len..].starts_with('}') {
            values
                .iter()
                .find(|(key, _)| *key == &after[..key_len])
                .map(|(_, value)| *value)
        } else {
            None
        };
        match substituted {
            Some(value) => {
                out.push_str(value);
                rest = &after[key_len + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
