//! Compact JSON form of the graph, for tooling and debugging

use crate::DependencyGraph;

impl DependencyGraph {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut graph: DependencyGraph = serde_json::from_str(json)?;
        graph.reindex();
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use crate::link;
    use weft_ast::{Expr, TypeIdentity};
    use weft_lexer::LexerConfig;

    fn parse(source: &str) -> Expr {
        let tokens = weft_lexer::tokenize(source, "App.swift", &LexerConfig::default()).unwrap();
        weft_parser::parse(tokens, "App.swift").unwrap()
    }

    const SOURCE: &str = "\
public final class App {
    // weaver: api = API <- APIProtocol
    // weaver: api.scope = .container
    // weaver: logger <- Logger
}
";

    #[test]
    fn test_abbreviated_keys() {
        let graph = link(&[parse(SOURCE)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();

        let app = &value["c"][0];
        assert_eq!(app["t"]["n"], "App");
        assert_eq!(app["a"], "p");
        assert_eq!(app["l"]["f"], "App.swift");

        let api = &value["e"][0];
        assert_eq!(api["n"], "api");
        assert_eq!(api["k"], "r");
        assert_eq!(api["at"][0]["n"], "APIProtocol");
        assert_eq!(api["c"]["s"], "c");
    }

    #[test]
    fn test_from_json_restores_lookups() {
        let graph = link(&[parse(SOURCE)]).unwrap();
        let restored = crate::DependencyGraph::from_json(&graph.to_json().unwrap()).unwrap();

        assert_eq!(restored, graph);
        assert_eq!(
            restored.id_of_type(&TypeIdentity::new("API")),
            graph.id_of_type(&TypeIdentity::new("API"))
        );
        assert_eq!(restored.id_of_name("logger"), graph.id_of_name("logger"));
    }
}
