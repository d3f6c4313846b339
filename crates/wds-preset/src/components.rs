//! Stylesheet template generation from component definitions.
//!
//! The template is what the stylesheet transformer expands. It has three
//! parts:
//!
//! 1. the `@tailwind` layer directives (`base`, `components`, `utilities`)
//! 2. one `@layer components { ... }` block with a rule per component,
//!    part, modifier and variant
//! 3. every definition's `styles` text, verbatim, in chain order
//!
//! For `btn: { apply: "px-4", parts: { icon: "w-4" } }` the component
//! layer holds:
//!
//! ```css
//! .btn {
//!   @apply px-4;
//! }
//! .btn__icon {
//!   @apply w-4;
//! }
//! ```

use std::fmt::Write;

use cssparser::serialize_identifier;
use indexmap::IndexMap;

use crate::preset::{ComponentDefinition, PresetDefinition};

const LAYERS: [&str; 3] = ["base", "components", "utilities"];

const PART_SEPARATOR: &str = "__";
const MODIFIER_SEPARATOR: &str = "--";
const VARIANT_SEPARATOR: &str = "-";

/// Generates the stylesheet template for a chain and its requested preset.
///
/// Components are merged by name across `chain` then `preset`; a later
/// definition of a component replaces the earlier one entirely.
pub fn generate_template(chain: &[PresetDefinition], preset: &PresetDefinition) -> String {
    let entries = || chain.iter().chain(std::iter::once(preset));

    let mut components: IndexMap<&str, &ComponentDefinition> = IndexMap::new();
    for definition in entries() {
        for (name, component) in &definition.components {
            components.insert(name.as_str(), component);
        }
    }

    let mut out = String::new();
    for layer in LAYERS {
        let _ = writeln!(out, "@tailwind {};", layer);
    }

    out.push_str("\n@layer components {\n");
    for (name, component) in &components {
        write_component(&mut out, name, component);
    }
    out.push_str("}\n");

    // Blocks are copied as written; a newline is only added so the next
    // block starts on its own line.
    for styles in entries().filter_map(|p| p.styles.as_deref()) {
        out.push('\n');
        out.push_str(styles);
        if !styles.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}

fn write_component(out: &mut String, name: &str, component: &ComponentDefinition) {
    write_rule(out, name, component.apply.as_deref());
    for (part, classes) in &component.parts {
        write_rule(out, &format!("{}{}{}", name, PART_SEPARATOR, part), Some(classes));
    }
    for (modifier, classes) in &component.modifiers {
        write_rule(out, &format!("{}{}{}", name, MODIFIER_SEPARATOR, modifier), Some(classes));
    }
    for (variant, classes) in &component.variants {
        write_rule(out, &format!("{}{}{}", name, VARIANT_SEPARATOR, variant), Some(classes));
    }
}

fn write_rule(out: &mut String, class: &str, apply: Option<&str>) {
    out.push('.');
    let _ = serialize_identifier(class, out);
    out.push_str(" {\n");
    if let Some(classes) = apply.map(str::trim).filter(|c| !c.is_empty()) {
        let _ = writeln!(out, "  @apply {};", classes);
    }
    out.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_template_has_layers() {
        let template = generate_template(&[], &PresetDefinition::new());
        assert_eq!(
            template,
            "@tailwind base;\n@tailwind components;\n@tailwind utilities;\n\n@layer components {\n}\n"
        );
    }

    #[test]
    fn test_component_rules() {
        let preset = PresetDefinition::new().with_component(
            "btn",
            ComponentDefinition::new("px-4 py-2")
                .part("icon", "w-4 h-4")
                .modifier("primary", "bg-primary")
                .variant("lg", "text-lg"),
        );
        let template = generate_template(&[], &preset);
        assert!(template.contains(
            "@layer components {\n\
             .btn {\n  @apply px-4 py-2;\n}\n\
             .btn__icon {\n  @apply w-4 h-4;\n}\n\
             .btn--primary {\n  @apply bg-primary;\n}\n\
             .btn-lg {\n  @apply text-lg;\n}\n\
             }\n"
        ));
    }

    #[test]
    fn test_component_override_replaces_whole_definition() {
        let base = PresetDefinition::named("base")
            .with_component("btn", ComponentDefinition::new("px-2").part("icon", "w-2"));
        let app = PresetDefinition::named("app").with_component("btn", ComponentDefinition::new("px-4"));

        let template = generate_template(&[base], &app);
        assert_eq!(template.matches(".btn {").count(), 1);
        assert!(template.contains("@apply px-4;"));
        assert!(!template.contains("px-2"));
        assert!(!template.contains(".btn__icon"));
    }

    #[test]
    fn test_component_order_first_seen() {
        let base = PresetDefinition::named("base")
            .with_component("card", ComponentDefinition::new("p-4"))
            .with_component("btn", ComponentDefinition::new("px-2"));
        let app = PresetDefinition::named("app")
            .with_component("badge", ComponentDefinition::new("text-xs"))
            .with_component("card", ComponentDefinition::new("p-8"));

        let template = generate_template(&[base], &app);
        let card = template.find(".card {").unwrap();
        let btn = template.find(".btn {").unwrap();
        let badge = template.find(".badge {").unwrap();
        assert!(card < btn && btn < badge);
    }

    #[test]
    fn test_component_without_apply_is_empty_rule() {
        let preset = PresetDefinition::new()
            .with_component("stack", ComponentDefinition::default().part("item", "mt-2"));
        let template = generate_template(&[], &preset);
        assert!(template.contains(".stack {\n}\n.stack__item {\n  @apply mt-2;\n}\n"));
    }

    #[test]
    fn test_styles_appended_in_chain_order() {
        let base = PresetDefinition::named("base").with_styles("body { margin: 0; }\n");
        let brand = PresetDefinition::named("brand").with_styles("   ");
        let app = PresetDefinition::named("app").with_styles("h1 { font-weight: 700; }");

        let template = generate_template(&[base, brand], &app);
        assert!(template.ends_with("}\n\nbody { margin: 0; }\n\n   \n\nh1 { font-weight: 700; }\n"));
    }

    #[test]
    fn test_styles_kept_verbatim() {
        let styles = "  p { color: red; }  \n\n\n/* tail */\n";
        let preset = PresetDefinition::new().with_styles(styles);
        let template = generate_template(&[], &preset);
        assert!(template.ends_with(&format!("}}\n\n{}", styles)));
    }

    #[test]
    fn test_class_names_are_escaped() {
        let preset = PresetDefinition::new().with_component("2col", ComponentDefinition::new("grid"));
        let template = generate_template(&[], &preset);
        assert!(template.contains(".\\32 col {"));
    }
}
