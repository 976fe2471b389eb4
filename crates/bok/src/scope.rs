//! Scope resolution: qualify nested definitions before lowering.
//!
//! A rename-only pass over the parse tree. Word definitions push their name
//! onto a scope stack, so a word `sq` nested inside `math` becomes
//! `math.sq`; variables are qualified the same way. References (`call` and
//! `dot` nodes) are resolved by walking the scope stack outward and taking
//! the longest qualified candidate recorded so far. Unknown bare names are
//! left untouched — they resolve at lowering time as top-level names or
//! late bindings, which is what makes forward references and mutual
//! recursion inside a word body work.
//!
//! Lists are traversed without opening a scope, so quotations see the same
//! names as the surrounding body.

use crate::parser::Node;

/// Rewrite names in place. Purely a rename: nothing is verified here.
pub fn resolve(nodes: &mut [Node]) {
    let mut scope = Vec::new();
    let mut known = Vec::new();
    walk(nodes, &mut scope, &mut known);
}

fn qualify(scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        let mut qualified = scope.join(".");
        qualified.push('.');
        qualified.push_str(name);
        qualified
    }
}

fn walk(nodes: &mut [Node], scope: &mut Vec<String>, known: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::List(items) => walk(items, scope, known),
            Node::Var(name) => {
                let scoped = qualify(scope, name);
                known.push(scoped.clone());
                *name = scoped;
            }
            Node::Call(name) | Node::Dot(name) => {
                let mut test_scope: Vec<String> = scope.clone();
                while !test_scope.is_empty() {
                    let scoped = qualify(&test_scope, name);
                    if known.contains(&scoped) {
                        *name = scoped;
                        break;
                    }
                    test_scope.pop();
                }
            }
            Node::Word { name, body, .. } => {
                let scoped = qualify(scope, name);
                scope.push(std::mem::replace(name, scoped.clone()));
                known.push(scoped);
                walk(body, scope, known);
                scope.pop();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn resolved(source: &str) -> Vec<Node> {
        let mut nodes = parse(source).unwrap();
        resolve(&mut nodes);
        nodes
    }

    #[test]
    fn qualifies_vars_and_reads() {
        let nodes = resolved("(square :x x x *)");
        let Node::Word { name, body, .. } = &nodes[0] else {
            panic!("expected word");
        };
        assert_eq!(name, "square");
        assert_eq!(body[0], Node::Var("square.x".into()));
        assert_eq!(body[1], Node::Call("square.x".into()));
        assert_eq!(body[2], Node::Call("square.x".into()));
    }

    #[test]
    fn qualifies_nested_words_and_references() {
        let nodes = resolved("(outer (inner 1 +) inner)");
        let Node::Word { name, body, .. } = &nodes[0] else {
            panic!("expected word");
        };
        assert_eq!(name, "outer");
        let Node::Word { name: inner, .. } = &body[0] else {
            panic!("expected nested word");
        };
        assert_eq!(inner, "outer.inner");
        assert_eq!(body[1], Node::Call("outer.inner".into()));
    }

    #[test]
    fn forward_references_resolve_within_a_body() {
        let nodes = resolved("(outer helper (helper 1))");
        let Node::Word { body, .. } = &nodes[0] else {
            panic!("expected word");
        };
        assert_eq!(body[0], Node::Call("outer.helper".into()));
    }

    #[test]
    fn lists_do_not_open_a_scope() {
        let nodes = resolved("(w :x [x])");
        let Node::Word { body, .. } = &nodes[0] else {
            panic!("expected word");
        };
        let Node::List(items) = &body[1] else {
            panic!("expected list");
        };
        assert_eq!(items[0], Node::Call("w.x".into()));
    }

    #[test]
    fn unknown_names_stay_bare() {
        let nodes = resolved("(w mystery)");
        let Node::Word { body, .. } = &nodes[0] else {
            panic!("expected word");
        };
        assert_eq!(body[0], Node::Call("mystery".into()));
    }
}
