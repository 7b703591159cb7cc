//! Tiered node/link graphs built from flat relational records.
//!
//! A [`GraphSchema`] names one record field per tier and the tier pairs that
//! become links. Nodes are unique by id and keep the attributes of the first
//! record that mentioned them. Links are never merged: every record adds one
//! link per relation, so repeated transactions show up as parallel links.

use std::collections::{BTreeSet, HashMap};

use egui::{pos2, Color32, Pos2};
use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::record::Record;

pub const RED: Color32 = Color32::from_rgb(255, 0, 0);
pub const BLUE: Color32 = Color32::from_rgb(0, 0, 255);
pub const GREEN: Color32 = Color32::from_rgb(0, 128, 0);

/// Tier of a node. Serialized as its number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Group {
    Category = 1,
    Intermediate = 2,
    Leaf = 3,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Category, Group::Intermediate, Group::Leaf];

    fn index(self) -> usize {
        self as usize - 1
    }
}

impl From<Group> for u8 {
    fn from(group: Group) -> Self {
        group as u8
    }
}

impl TryFrom<u8> for Group {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Group::Category),
            2 => Ok(Group::Intermediate),
            3 => Ok(Group::Leaf),
            other => Err(format!("node group must be 1, 2 or 3, got {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub group: Group,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Pos2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Node {
    fn new(id: impl Into<String>, group: Group) -> Self {
        Self {
            id: id.into(),
            group,
            fixed: None,
            color: None,
            category: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// How node colors are chosen.
#[derive(Clone, Copy, Debug)]
pub enum Coloring {
    /// Every node takes the palette color of its record's category value.
    ByCategory(&'static [(&'static str, Color32)]),
    /// One color per tier, category first.
    ByGroup([Color32; 3]),
}

impl Coloring {
    fn color(&self, group: Group, category: Option<&str>) -> Option<Color32> {
        match self {
            Coloring::ByCategory(palette) => category.and_then(|category| {
                palette
                    .iter()
                    .find(|(name, _)| *name == category)
                    .map(|(_, color)| *color)
            }),
            Coloring::ByGroup(colors) => Some(colors[group.index()]),
        }
    }
}

/// Where nodes are pinned.
#[derive(Clone, Copy, Debug)]
pub enum Layout {
    /// Category nodes on one row spaced `category_step` apart, intermediate
    /// nodes on a second row advancing an x-cursor by `cursor_step`, leaf
    /// nodes on a third row at the cursor.
    Tiered {
        origin_x: f32,
        category_step: f32,
        cursor_step: f32,
        rows: [f32; 3],
    },
    /// Left to the renderer.
    Free,
}

#[derive(Clone, Copy, Debug)]
pub struct GraphSchema {
    pub name: &'static str,
    /// Record field holding the node id for each tier.
    pub tiers: [&'static str; 3],
    /// Tier pairs that become links, in insertion order per record.
    pub relations: &'static [(Group, Group)],
    /// Record field copied into each new node's category tag.
    pub category_field: Option<&'static str>,
    /// Category nodes created before any record is read.
    pub seeds: &'static [&'static str],
    pub coloring: Coloring,
    pub layout: Layout,
}

const FISH_PALETTE: [(&str, Color32); 3] = [
    ("Offidiaa/Piscis osseus", RED),
    ("Sockfish/Pisces foetida", BLUE),
    ("Helenaa/Pisces satis", GREEN),
];

const FISH_TYPES: [&str; 3] = [
    FISH_PALETTE[0].0,
    FISH_PALETTE[1].0,
    FISH_PALETTE[2].0,
];

const CHAIN: [(Group, Group); 2] = [
    (Group::Category, Group::Intermediate),
    (Group::Intermediate, Group::Leaf),
];

/// fish type -> catch report -> location, from `/main/combined/`.
pub const FISH_TRACKING: GraphSchema = GraphSchema {
    name: "fish tracking",
    tiers: ["fish_type_name", "report_id", "location_id"],
    relations: &CHAIN,
    category_field: Some("fish_type_name"),
    seeds: &FISH_TYPES,
    coloring: Coloring::ByCategory(&FISH_PALETTE),
    layout: Layout::Tiered {
        origin_x: 100.0,
        category_step: 300.0,
        cursor_step: 40.0,
        rows: [100.0, 400.0, 700.0],
    },
};

/// location -> vessel -> delivery report, from `/main/cargo-vessel/`.
pub const CARGO_DELIVERY: GraphSchema = GraphSchema {
    name: "cargo delivery",
    tiers: ["location_id", "vessel_name", "delivery_report_id"],
    relations: &CHAIN,
    category_field: None,
    seeds: &[],
    coloring: Coloring::ByGroup([RED, BLUE, GREEN]),
    layout: Layout::Free,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub links: Vec<Edge>,
}

/// Nodes and link indices lit by selecting a category node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
    pub nodes: BTreeSet<String>,
    pub links: BTreeSet<usize>,
}

impl Highlight {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl GraphModel {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Two-hop forward closure from a category node: its outgoing links and
    /// their targets, then the outgoing links of those targets and theirs.
    /// Any other node highlights nothing.
    pub fn highlight(&self, id: &str) -> Highlight {
        let mut lit = Highlight::default();
        if !self.node(id).is_some_and(|node| node.group == Group::Category) {
            return lit;
        }
        lit.nodes.insert(id.to_owned());

        for (first, link) in self.links.iter().enumerate() {
            if link.source != id {
                continue;
            }
            lit.links.insert(first);
            lit.nodes.insert(link.target.clone());
            for (second, next) in self.links.iter().enumerate() {
                if next.source == link.target {
                    lit.links.insert(second);
                    lit.nodes.insert(next.target.clone());
                }
            }
        }
        lit
    }
}

struct Builder<'s> {
    schema: &'s GraphSchema,
    model: GraphModel,
    index: HashMap<String, usize>,
    cursor: f32,
}

impl<'s> Builder<'s> {
    fn new(schema: &'s GraphSchema) -> Self {
        let cursor = match schema.layout {
            Layout::Tiered { origin_x, .. } => origin_x,
            Layout::Free => 0.0,
        };
        let mut builder = Self {
            schema,
            model: GraphModel::default(),
            index: HashMap::new(),
            cursor,
        };
        for (slot, seed) in schema.seeds.iter().enumerate() {
            let fixed = match schema.layout {
                Layout::Tiered {
                    origin_x,
                    category_step,
                    rows,
                    ..
                } => Some(pos2(origin_x + category_step * slot as f32, rows[0])),
                Layout::Free => None,
            };
            let mut node = Node::new(*seed, Group::Category);
            node.fixed = fixed;
            node.color = schema.coloring.color(Group::Category, Some(seed));
            builder.push(node);
        }
        builder
    }

    fn push(&mut self, node: Node) {
        self.index.insert(node.id.clone(), self.model.nodes.len());
        self.model.nodes.push(node);
    }

    /// First mention wins; later mentions leave the node untouched.
    fn ensure(&mut self, id: &str, group: Group, category: Option<&str>) {
        if self.index.contains_key(id) {
            return;
        }
        let mut node = Node::new(id, group);
        node.color = self.schema.coloring.color(group, category);
        node.category = category.map(str::to_owned);
        if let Layout::Tiered {
            cursor_step, rows, ..
        } = self.schema.layout
        {
            match group {
                Group::Category => {}
                Group::Intermediate => {
                    node.fixed = Some(pos2(self.cursor, rows[1]));
                    self.cursor += cursor_step;
                }
                Group::Leaf => node.fixed = Some(pos2(self.cursor, rows[2])),
            }
        }
        self.push(node);
    }

    fn add(&mut self, record: &Record) -> Result<(), ShapeError> {
        let ids = [
            record.id(self.schema.tiers[0])?,
            record.id(self.schema.tiers[1])?,
            record.id(self.schema.tiers[2])?,
        ];
        let category = match self.schema.category_field {
            Some(field) => Some(record.id(field)?),
            None => None,
        };
        for group in Group::ALL {
            self.ensure(&ids[group.index()], group, category.as_deref());
        }
        for (source, target) in self.schema.relations {
            self.model.links.push(Edge {
                source: ids[source.index()].clone(),
                target: ids[target.index()].clone(),
            });
        }
        Ok(())
    }
}

/// Builds a graph from `records`. Records missing a tier field are skipped.
pub fn build(records: &[Record], schema: &GraphSchema) -> GraphModel {
    let _span = tracing::info_span!("graph_build", schema = schema.name, records = records.len())
        .entered();
    let mut builder = Builder::new(schema);
    for record in records {
        if let Err(err) = builder.add(record) {
            log::warn!("skipping record in {} graph: {err}", schema.name);
        }
    }
    log::debug!(
        "{} graph: {} nodes, {} links",
        schema.name,
        builder.model.nodes.len(),
        builder.model.links.len()
    );
    builder.model
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catch(fish: &str, report: &str, location: &str) -> Record {
        Record::from_value(json!({
            "fish_type_name": fish,
            "report_id": report,
            "location_id": location,
            "date": "2035-03-04",
        }))
        .unwrap()
    }

    fn delivery(location: &str, vessel: &str, report: &str) -> Record {
        Record::from_value(json!({
            "location_id": location,
            "vessel_name": vessel,
            "delivery_report_id": report,
            "transaction_date": "2035-03-04",
        }))
        .unwrap()
    }

    #[test]
    fn shared_category_yields_one_node_and_two_links() {
        let records = [
            delivery("Himark", "Arctic Tern", "r1"),
            delivery("Himark", "Bluefin", "r2"),
        ];
        let graph = build(&records, &CARGO_DELIVERY);
        let himark: Vec<_> = graph.nodes.iter().filter(|n| n.id == "Himark").collect();
        assert_eq!(himark.len(), 1);
        let from_himark = graph.links.iter().filter(|l| l.source == "Himark").count();
        assert_eq!(from_himark, 2);
        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.links.len(), 4);
    }

    #[test]
    fn repeated_transactions_keep_parallel_links() {
        let records = [
            delivery("Himark", "Arctic Tern", "r1"),
            delivery("Himark", "Arctic Tern", "r1"),
        ];
        let graph = build(&records, &CARGO_DELIVERY);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.links.len(), 4);
    }

    #[test]
    fn first_mention_fixes_node_attributes() {
        let records = [
            catch("Sockfish/Pisces foetida", "c1", "Cod Table"),
            catch("Helenaa/Pisces satis", "c2", "Cod Table"),
        ];
        let graph = build(&records, &FISH_TRACKING);
        let location = graph.node("Cod Table").unwrap();
        assert_eq!(location.color, Some(BLUE));
        assert_eq!(location.category.as_deref(), Some("Sockfish/Pisces foetida"));
        assert_eq!(location.fixed, Some(pos2(140.0, 700.0)));
    }

    #[test]
    fn fish_schema_seeds_and_lays_out_tiers() {
        let graph = build(&[catch("Offidiaa/Piscis osseus", "c1", "Nemo Reef")], &FISH_TRACKING);
        let seeds: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.group == Group::Category)
            .map(|n| (n.fixed.unwrap(), n.color.unwrap()))
            .collect();
        assert_eq!(
            seeds,
            [
                (pos2(100.0, 100.0), RED),
                (pos2(400.0, 100.0), BLUE),
                (pos2(700.0, 100.0), GREEN),
            ]
        );
        assert_eq!(graph.node("c1").unwrap().fixed, Some(pos2(100.0, 400.0)));
        assert_eq!(graph.node("Nemo Reef").unwrap().fixed, Some(pos2(140.0, 700.0)));
    }

    #[test]
    fn records_missing_a_tier_are_skipped() {
        let broken = Record::from_value(json!({"location_id": "Himark", "vessel_name": "X"})).unwrap();
        let graph = build(&[broken, delivery("Lomark", "Y", "r9")], &CARGO_DELIVERY);
        assert!(graph.node("Himark").is_none());
        assert_eq!(graph.links.len(), 2);
    }

    #[test]
    fn highlight_is_a_two_hop_closure_from_categories() {
        let records = [
            catch("Offidiaa/Piscis osseus", "c1", "Nemo Reef"),
            catch("Sockfish/Pisces foetida", "c2", "Cod Table"),
        ];
        let mut graph = build(&records, &FISH_TRACKING);
        // A third hop must stay dark.
        graph.links.push(Edge {
            source: "Nemo Reef".into(),
            target: "Deep".into(),
        });

        let lit = graph.highlight("Offidiaa/Piscis osseus");
        assert_eq!(
            lit.nodes.iter().map(String::as_str).collect::<Vec<_>>(),
            ["Nemo Reef", "Offidiaa/Piscis osseus", "c1"]
        );
        assert_eq!(lit.links.iter().copied().collect::<Vec<_>>(), [0, 1]);

        assert!(graph.highlight("c1").is_empty());
        assert!(graph.highlight("missing").is_empty());
    }

    #[test]
    fn groups_serialize_as_numbers() {
        let graph = build(&[delivery("Himark", "X", "r1")], &CARGO_DELIVERY);
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["nodes"][0]["group"], json!(1));
        let back: GraphModel = serde_json::from_value(value).unwrap();
        assert_eq!(back, graph);
    }
}
