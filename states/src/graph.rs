use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Debug, Formatter},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError<T>
where
    T: Debug,
{
    #[error("Cycle detected in dependency graph, from {:?}", .0)]
    CycleDetected(DepRoute<T>),
    #[error("Duplicate edge detected in dependency graph, from {:?} to {:?}", .0.route[0], .0.route[1])]
    DuplicateEdge(DepRoute<T>),
}

pub struct DepRoute<T> {
    // first means the start node, last means the end node
    route: Vec<T>,
}

impl<T> Debug for DepRoute<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let len = self.route.len();
        if len == 0 {
            return write!(f, "[]");
        }
        for item in &self.route[..len - 1] {
            write!(f, "{item:?} -> ")?;
        }
        write!(f, "{:?}", self.route[len - 1])
    }
}

/// Dependency graph between states and computes. An edge `from -> to`
/// means `to` reads `from`.
#[derive(Debug)]
pub struct Graph<Node>
where
    Node: Debug + PartialEq + Copy + Ord,
{
    routes: Vec<(Node, Node)>,
}

impl<Node> Default for Graph<Node>
where
    Node: Debug + PartialEq + Copy + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Node> Graph<Node>
where
    Node: Debug + PartialEq + Copy + Ord,
{
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub fn route_to(&mut self, from: Node, to: Node) {
        self.routes.push((from, to));
    }

    fn in_degrees(&self) -> BTreeMap<Node, usize> {
        let mut degrees = BTreeMap::<Node, usize>::new();

        for &(from, to) in &self.routes {
            degrees.entry(from).or_insert(0);
            *degrees.entry(to).or_insert(0) += 1;
        }

        degrees
    }

    /// Kahn's algorithm. Returns every node, dependencies first.
    pub fn topology_sort(&self) -> Result<Vec<Node>, TopologyError<Node>> {
        let mut degrees = self.in_degrees();
        let mut order = Vec::with_capacity(degrees.len());

        while !degrees.is_empty() {
            let Some((&node, _)) = degrees.iter().find(|(_, deg)| **deg == 0) else {
                let keys: Vec<Node> = degrees.keys().copied().collect();
                let route = self.find_cycle(&keys).unwrap_or_default();
                return Err(TopologyError::CycleDetected(DepRoute { route }));
            };

            degrees.remove(&node);
            order.push(node);

            for connected in self.direct_connected_nodes(node)? {
                if let Some(deg) = degrees.get_mut(&connected) {
                    *deg -= 1;
                }
            }
        }

        Ok(order)
    }

    fn find_cycle(&self, nodes: &[Node]) -> Option<Vec<Node>> {
        let neighbours_of = |node: Node| {
            self.direct_connected_nodes(node)
                .unwrap_or_default()
                .into_iter()
                .filter(|n| nodes.contains(n))
                .collect::<Vec<_>>()
                .into_iter()
        };

        let mut visited = BTreeSet::new();
        let mut path_set = BTreeSet::new();
        let mut path = Vec::new();
        let mut stack: Vec<(Node, std::vec::IntoIter<Node>)> = Vec::new();

        for &start_node in nodes {
            if visited.contains(&start_node) {
                continue;
            }

            stack.push((start_node, neighbours_of(start_node)));
            visited.insert(start_node);
            path_set.insert(start_node);
            path.push(start_node);

            while let Some((current_node, neighbours)) = stack.last_mut() {
                if let Some(neighbour) = neighbours.next() {
                    if path_set.contains(&neighbour) {
                        if let Some(pos) = path.iter().position(|&x| x == neighbour) {
                            let mut cycle = path[pos..].to_vec();
                            cycle.push(neighbour);
                            return Some(cycle);
                        }
                    } else if !visited.contains(&neighbour) {
                        visited.insert(neighbour);
                        path_set.insert(neighbour);
                        path.push(neighbour);
                        stack.push((neighbour, neighbours_of(neighbour)));
                    }
                } else {
                    let node_to_remove = *current_node;
                    stack.pop();
                    path_set.remove(&node_to_remove);
                    path.pop();
                }
            }
        }
        None
    }

    fn direct_connected_nodes(&self, node: Node) -> Result<BTreeSet<Node>, TopologyError<Node>> {
        let mut collected = BTreeSet::new();

        for &(from, to) in &self.routes {
            if from == node && !collected.insert(to) {
                return Err(TopologyError::DuplicateEdge(DepRoute {
                    route: vec![node, to],
                }));
            }
        }

        Ok(collected)
    }
}
