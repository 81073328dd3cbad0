//! The five architecture styles archscan knows about

use super::spec::PatternSpec;

pub fn hexagonal() -> PatternSpec {
    PatternSpec::new("hexagonal")
        .required(&["domain", "ports", "adapters"])
        .optional(&["application", "infrastructure", "services"])
        .alternative("adapters", &["adapter", "infrastructure"])
        .alternative("ports", &["port", "interfaces"])
        .class_suffixes(&["Port", "Adapter", "UseCase"])
        .rule("domain", "adapters", "domain_imports_adapter")
        .rule("domain", "infrastructure", "domain_imports_infrastructure")
        .rule("ports", "adapters", "port_imports_adapter")
}

pub fn layered() -> PatternSpec {
    PatternSpec::new("layered")
        .required(&["presentation", "business", "data"])
        .optional(&["services", "models", "utils"])
        .forbidden(&["ports", "adapters"])
        .alternative("presentation", &["api", "views", "controllers", "ui", "web"])
        .alternative("business", &["services", "domain", "logic", "core"])
        .alternative("data", &["repositories", "persistence", "dal", "db"])
        .class_suffixes(&["Service", "Repository", "Controller"])
        .rule("data", "presentation", "data_imports_presentation")
        .rule("business", "presentation", "business_imports_presentation")
        .rule("presentation", "data", "presentation_skips_business")
}

pub fn ddd() -> PatternSpec {
    PatternSpec::new("ddd")
        .required(&["domain", "application", "infrastructure"])
        .optional(&["entities", "value_objects", "aggregates", "repositories", "events"])
        .alternative("infrastructure", &["infra"])
        .class_suffixes(&["Entity", "ValueObject", "Aggregate", "Repository"])
        .rule("domain", "infrastructure", "domain_imports_infrastructure")
        .rule("domain", "application", "domain_imports_application")
}

pub fn cqrs() -> PatternSpec {
    PatternSpec::new("cqrs")
        .required(&["commands", "queries"])
        .optional(&["handlers", "events", "read_models", "write_models"])
        .alternative("commands", &["command", "write"])
        .alternative("queries", &["query", "read"])
        .class_suffixes(&["Command", "Query", "Handler"])
        .rule("queries", "commands", "query_imports_command")
        .rule("read_models", "write_models", "read_model_imports_write_model")
}

pub fn mvc() -> PatternSpec {
    PatternSpec::new("mvc")
        .required(&["models", "views", "controllers"])
        .optional(&["templates", "static"])
        .alternative("controllers", &["controller", "handlers", "routes"])
        .alternative("views", &["view", "templates"])
        .alternative("models", &["model"])
        .class_suffixes(&["Controller", "View", "Model"])
        .rule("models", "views", "model_imports_view")
        .rule("models", "controllers", "model_imports_controller")
}

/// Every built-in spec, in reporting order
pub fn builtin_specs() -> Vec<PatternSpec> {
    vec![hexagonal(), layered(), ddd(), cqrs(), mvc()]
}
