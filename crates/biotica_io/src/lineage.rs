//! Species ancestry projection: a directed graph over the registry's
//! parent links, exportable to Graphviz DOT. Read-only; built on demand
//! from a snapshot of the species records.

use biotica_data::SpeciesRecord;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

pub struct AncestryNode {
    pub id: String,
    pub common_name: String,
    pub population: u32,
    pub created_tick: u64,
    pub extinct: bool,
}

pub struct SpeciesAncestryTree {
    pub graph: DiGraph<AncestryNode, ()>,
    id_map: HashMap<String, NodeIndex>,
}

impl SpeciesAncestryTree {
    /// Build from the registry's records. Parents always precede children in
    /// the registry (species are append-only), so a single pass suffices.
    #[must_use]
    pub fn build(species: &[SpeciesRecord]) -> Self {
        let mut graph = DiGraph::new();
        let mut id_map = HashMap::new();

        for rec in species {
            let idx = graph.add_node(AncestryNode {
                id: rec.id.clone(),
                common_name: rec.common_name.clone(),
                population: rec.population,
                created_tick: rec.created_tick,
                extinct: rec.population == 0,
            });
            id_map.insert(rec.id.clone(), idx);
        }
        for rec in species {
            if let Some(parent) = &rec.parent_species_id {
                if let (Some(&p), Some(&c)) = (id_map.get(parent), id_map.get(&rec.id)) {
                    graph.add_edge(p, c, ());
                }
            }
        }
        Self { graph, id_map }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&AncestryNode> {
        self.id_map.get(id).map(|&idx| &self.graph[idx])
    }

    /// Export to Graphviz DOT; extinct lineages render gray.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph SpeciesAncestry {\n");
        dot.push_str("  node [shape=box, style=filled, fontname=\"Arial\"];\n");
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let fill = if node.extinct { "#eeeeee" } else { "#e1f5fe" };
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\\npop {} (t{})\", fillcolor=\"{}\"];\n",
                node.id, node.common_name, node.population, node.created_tick, fill
            ));
        }
        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                dot.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    self.graph[from].id, self.graph[to].id
                ));
            }
        }
        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biotica_core::species::SpeciesRegistry;
    use biotica_data::Genome;

    #[test]
    fn tree_links_parent_to_child() {
        let mut reg = SpeciesRegistry::new(1);
        let root = reg.create_species(&Genome::baseline(), 0, None);
        let child = reg.create_species(&Genome::baseline(), 5, Some(root.clone()));

        let tree = SpeciesAncestryTree::build(&reg.species);
        assert_eq!(tree.graph.node_count(), 2);
        assert_eq!(tree.graph.edge_count(), 1);
        assert!(tree.node(&root).is_some());

        let dot = tree.to_dot();
        assert!(dot.contains(&format!("\"{root}\" -> \"{child}\"")));
    }
}
