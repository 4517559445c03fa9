//! C++ emission: registration, static metadata and serialization bodies.
//!
//! Each pass is a pure function of the registry. [`render`] concatenates them
//! in a fixed order and appends the plugin-name trailer.

use crate::types::{ClassMeta, ClassRegistry};

/// Name of the generated registration entry point.
pub const REGISTER_FN: &str = "_AkariGeneratedMeta";

/// Macro carrying the target name for downstream build use.
pub const PLUGIN_NAME_MACRO: &str = "__AKR_PLUGIN_NAME__";

/// Render the complete generated translation unit.
pub fn render(registry: &ClassRegistry, target: &str) -> String {
    let mut out = render_registration(registry);
    out.push_str(&render_static_meta(registry));
    out.push_str(&render_serialization(registry));
    out.push_str(&format!("#define {PLUGIN_NAME_MACRO} \"{target}\"\n"));
    out
}

// ---------------------------------------------------------------------------
// Pass 1: runtime registration
// ---------------------------------------------------------------------------

/// One function registering every class with the runtime reflection system.
pub fn render_registration(registry: &ClassRegistry) -> String {
    let mut out = format!("void {REGISTER_FN}(Plugin &p){{\n");
    for meta in registry {
        let name = &meta.name;
        let bases: String = meta.bases.iter().map(|b| format!(",{b}")).collect();
        out.push_str(" {\n");
        out.push_str(&format!("  auto c = class_<{name}{bases}>(\"{name}\");\n"));
        for field in &meta.fields {
            out.push_str(&format!("  c.property(\"{field}\", &{name}::{field});\n"));
        }
        for method in &meta.methods {
            out.push_str(&format!("  c.method(\"{method}\", &{name}::{method});\n"));
        }
        out.push_str(&format!("  c.method(\"save\", &{name}::save);\n"));
        out.push_str(&format!("  c.method(\"load\", &{name}::load);\n"));
        out.push_str(" }\n");
    }
    out.push_str("}\n");
    out
}

// ---------------------------------------------------------------------------
// Pass 2: static metadata
// ---------------------------------------------------------------------------

/// One `StaticMeta<T>` specialization per class.
pub fn render_static_meta(registry: &ClassRegistry) -> String {
    let mut out = String::new();
    for meta in registry {
        out.push_str(&static_meta_for(meta));
    }
    out
}

fn static_meta_for(meta: &ClassMeta) -> String {
    let name = &meta.name;
    let mut out = format!("template<> struct StaticMeta<{name}>{{\n");
    for field in &meta.fields {
        out.push_str(&format!(
            "  static constexpr StaticAttribute _attr_{field}[] = {{ {{\"name\", \"{field}\" }} }};\n"
        ));
    }
    out.push_str(&format!("  static size_t property_count() {{return {};}}\n", meta.fields.len()));
    out.push_str(&format!("  static size_t method_count() {{return {};}}\n", meta.methods.len()));
    for qualifier in ["", "const "] {
        out.push_str(&format!(
            "  template<class F>static void foreach_property({qualifier}{name} & object,F && f){{\n"
        ));
        for field in &meta.fields {
            out.push_str(&format!(
                "    f(StaticProperty::make(\"{field}\", _attr_{field}), object.{field});\n"
            ));
        }
        out.push_str("  }\n");
    }
    out.push_str("};\n");
    out
}

// ---------------------------------------------------------------------------
// Pass 3: serialization bodies
// ---------------------------------------------------------------------------

/// `save`/`load` definitions per class, driven by `StaticMeta<T>::foreach_property`.
pub fn render_serialization(registry: &ClassRegistry) -> String {
    let mut out = String::new();
    for meta in registry {
        let name = &meta.name;
        out.push_str(&format!("void {name}::save(serialize::OutputArchive &ar)const{{\n"));
        if !meta.fields.is_empty() {
            out.push_str("  akari::serialize::AutoSaveVisitor v{ar};\n");
            out.push_str(&visit_all(name, "std::forward<const T>(prop)"));
        }
        out.push_str("}\n");
        out.push_str(&format!("void {name}::load(serialize::InputArchive &ar){{\n"));
        if !meta.fields.is_empty() {
            out.push_str("  akari::serialize::AutoLoadVisitor v{ar};\n");
            out.push_str(&visit_all(name, "std::forward<T>(prop)"));
        }
        out.push_str("}\n");
    }
    out
}

/// Adapter lambda forwarding each property to the archive visitor `v`.
fn visit_all(class_name: &str, forwarded: &str) -> String {
    format!(
        "  StaticMeta<{class_name}>::foreach_property(*this, [&](const StaticProperty& meta, auto && prop){{\n\
         \x20     using T = std::decay_t<decltype(prop)>;\n\
         \x20     v.visit({forwarded}, meta.name.data());\n\
         \x20 }});\n"
    )
}
