#![allow(missing_docs)]

use proptest::prelude::*;
use proptest::sample::Index;
use serde::{Deserialize, Serialize};
use shadowptr::{BincodeReader, BincodeWriter, InputArchive, OutputArchive, Ptr, Saving, Traverse};

#[derive(Serialize, Deserialize, Traverse, Debug, Default)]
struct Graph {
    nodes: Vec<i64>,
    links: Vec<Ptr<i64>>,
}

fn build(nodes: Vec<i64>, picks: &[Option<Index>]) -> Graph {
    let mut graph = Graph {
        nodes,
        links: Vec::new(),
    };
    graph.links = picks
        .iter()
        .map(|pick| match pick {
            Some(index) => Ptr::new(&graph.nodes[index.index(graph.nodes.len())]),
            None => Ptr::null(),
        })
        .collect();
    graph
}

fn save(graph: &Graph) -> shadowptr::Result<Vec<u8>> {
    let mut sink = BincodeWriter::new(Vec::new());
    {
        let mut archive = OutputArchive::new(&mut sink);
        archive.invoke(graph)?;
        archive.complete()?;
    }
    sink.finish()
}

fn load(bytes: &[u8]) -> shadowptr::Result<Graph> {
    let mut loaded = Graph::default();
    {
        let mut source = BincodeReader::new(bytes);
        let mut archive = InputArchive::new(&mut source);
        archive.invoke(&mut loaded)?;
        archive.complete()?;
    }
    Ok(loaded)
}

proptest! {
    #[test]
    fn prop_links_follow_their_nodes(
        nodes in proptest::collection::vec(any::<i64>(), 1..64),
        picks in proptest::collection::vec(proptest::option::of(any::<Index>()), 0..32),
    ) {
        let graph = build(nodes, &picks);
        let bytes = save(&graph)?;
        let loaded = load(&bytes)?;

        prop_assert_eq!(&loaded.nodes, &graph.nodes);
        prop_assert_eq!(loaded.links.len(), picks.len());
        for (link, pick) in loaded.links.iter().zip(&picks) {
            match pick {
                Some(index) => {
                    let target = &loaded.nodes[index.index(loaded.nodes.len())];
                    prop_assert!(link.points_to(target));
                }
                None => prop_assert!(link.is_null()),
            }
        }
    }

    #[test]
    fn prop_values_are_plain_bincode(
        nodes in proptest::collection::vec(any::<i64>(), 1..64),
        picks in proptest::collection::vec(proptest::option::of(any::<Index>()), 0..32),
    ) {
        let graph = build(nodes, &picks);
        let bytes = save(&graph)?;

        let mut plain = BincodeWriter::new(Vec::new());
        plain.save(&graph)?;
        let prefix = plain.finish()?;

        prop_assert!(bytes.starts_with(&prefix));
        prop_assert!(bytes.len() >= prefix.len() + 1 + picks.len());
    }
}
