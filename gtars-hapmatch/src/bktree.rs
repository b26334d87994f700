use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::hash::{BuildHasher, Hash};

use crate::distance::{Allele, Distance, Hamming, Metric};
use crate::errors::{HapMatchError, Result};

/// A node of a [`BKTree`].
///
/// Holds one representative vector, every element that was inserted with exactly that
/// vector, and its children keyed by their distance to `vector`. Every vector in the
/// subtree below the child at key `d` is at distance exactly `d` from this node's vector.
#[derive(Debug, Clone)]
pub struct BKTreeNode<E> {
    vector: Vec<Allele>,
    elements: Vec<E>,
    children: BTreeMap<Distance, BKTreeNode<E>>,
}

impl<E> BKTreeNode<E> {
    fn new(vector: Vec<Allele>, elements: Vec<E>) -> Self {
        Self {
            vector,
            elements,
            children: BTreeMap::new(),
        }
    }

    pub fn vector(&self) -> &[Allele] {
        &self.vector
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    /// Children in ascending order of edge distance.
    pub fn children(&self) -> impl Iterator<Item = (Distance, &BKTreeNode<E>)> {
        self.children.iter().map(|(d, child)| (*d, child))
    }

    /// A node can never be a lookup result if it has no elements or only skipped ones.
    /// It is still traversed, since its subtree may hold valid matches.
    fn is_ignorable<S>(&self, skip: &HashSet<E, S>) -> bool
    where
        E: Eq + Hash,
        S: BuildHasher,
    {
        self.elements.iter().all(|element| skip.contains(element))
    }
}

/// The outcome of [`BKTree::insert`].
#[derive(Debug)]
pub struct Insertion<'a, E> {
    /// The node that now holds the inserted elements.
    pub node: &'a BKTreeNode<E>,
    /// Smallest distance computed along the insertion path. `None` when the tree was
    /// empty and no comparison was made.
    pub min_distance: Option<Distance>,
}

/// The outcome of a nearest-neighbor lookup.
#[derive(Debug)]
pub struct Lookup<'a, E> {
    /// All usable nodes tied for the best distance. Order among ties is unspecified.
    pub nodes: Vec<&'a BKTreeNode<E>>,
    /// The best distance, or `None` if no usable neighbor exists.
    pub distance: Option<Distance>,
    /// Number of nodes whose distance to the query was computed.
    pub visited: usize,
}

impl<'a, E> Lookup<'a, E> {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            distance: None,
            visited: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn vectors(&self) -> Vec<&'a [Allele]> {
        self.nodes.iter().map(|node| node.vector()).collect()
    }
}

///
/// A Burkhard-Keller tree: a metric tree over fixed-length discrete vectors.
///
/// Each node's children are keyed by their exact distance to the node, which lets a
/// lookup prune whole subtrees with the triangle inequality. `E` is an opaque element
/// identifier (e.g. a sample name) that the tree only stores and hands back.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use gtars_hapmatch::BKTree;
///
/// let mut tree = BKTree::new();
/// tree.insert(["A"], vec![0, 0, 0]).unwrap();
/// tree.insert(["B"], vec![0, 0, 1]).unwrap();
/// tree.insert(["C"], vec![1, 1, 1]).unwrap();
///
/// let hits = tree.lookup(&[0, 1, 1], &HashSet::new()).unwrap();
/// assert_eq!(hits.distance, Some(1));
/// assert_eq!(hits.nodes.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct BKTree<E, M = Hamming> {
    root: Option<BKTreeNode<E>>,
    metric: M,
    dimension: Option<usize>,
    len: usize,
    num_elements: usize,
}

impl<E> BKTree<E, Hamming> {
    pub fn new() -> Self {
        Self::with_metric(Hamming)
    }
}

impl<E> Default for BKTree<E, Hamming> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, M: Metric> BKTree<E, M> {
    pub fn with_metric(metric: M) -> Self {
        Self {
            root: None,
            metric,
            dimension: None,
            len: 0,
            num_elements: 0,
        }
    }

    /// Length of the vectors held by this tree, fixed by the first insertion.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of nodes (distinct vectors).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of elements across all nodes.
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&BKTreeNode<E>> {
        self.root.as_ref()
    }

    fn check_dimension(&self, found: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != found => {
                Err(HapMatchError::DimensionMismatch { expected, found })
            }
            _ => Ok(()),
        }
    }

    ///
    /// Insert `elements` under `vector`.
    ///
    /// Walks down from the root following the edge keyed by the distance to each node.
    /// An exact match accumulates the elements on the existing node; otherwise a new leaf
    /// is attached where the path runs out. Nodes are never moved once inserted.
    ///
    /// # Arguments
    /// - elements: identifiers associated with the vector
    /// - vector: the vector to index
    ///
    /// # Returns
    /// - the node holding the elements and the smallest distance seen along the path
    ///
    pub fn insert<I>(&mut self, elements: I, vector: Vec<Allele>) -> Result<Insertion<'_, E>>
    where
        I: IntoIterator<Item = E>,
    {
        self.check_dimension(vector.len())?;
        let elements: Vec<E> = elements.into_iter().collect();

        let Self {
            root,
            metric,
            dimension,
            len,
            num_elements,
        } = self;
        *num_elements += elements.len();

        let mut current = match root {
            Some(node) => node,
            None => {
                *dimension = Some(vector.len());
                *len += 1;
                let node = root.insert(BKTreeNode::new(vector, elements));
                return Ok(Insertion {
                    node,
                    min_distance: None,
                });
            }
        };

        let mut min_distance = Distance::MAX;
        loop {
            let k = metric.distance(&current.vector, &vector);
            min_distance = min_distance.min(k);

            if k == 0 {
                current.elements.extend(elements);
                return Ok(Insertion {
                    node: current,
                    min_distance: Some(min_distance),
                });
            }

            match current.children.entry(k) {
                Entry::Occupied(entry) => current = entry.into_mut(),
                Entry::Vacant(entry) => {
                    *len += 1;
                    let node = entry.insert(BKTreeNode::new(vector, elements));
                    return Ok(Insertion {
                        node,
                        min_distance: Some(min_distance),
                    });
                }
            }
        }
    }

    ///
    /// Find the nearest usable neighbor(s) of `query`.
    ///
    /// Nodes that hold no elements, or only elements in `skip`, are traversed but never
    /// returned. An unskipped exact match ends the search immediately. Otherwise every
    /// node tied for the best distance is returned.
    ///
    /// # Arguments
    /// - query: the query vector
    /// - skip: elements that do not count as a match for this query
    ///
    pub fn lookup<S>(&self, query: &[Allele], skip: &HashSet<E, S>) -> Result<Lookup<'_, E>>
    where
        E: Eq + Hash,
        S: BuildHasher,
    {
        self.check_dimension(query.len())?;
        let Some(root) = self.root.as_ref() else {
            return Ok(Lookup::empty());
        };

        let mut stack = vec![root];
        let mut nodes: Vec<&BKTreeNode<E>> = Vec::new();
        let mut best = Distance::MAX;
        let mut visited = 0;

        while let Some(node) = stack.pop() {
            let dist = self.metric.distance(&node.vector, query);
            visited += 1;

            if !node.is_ignorable(skip) {
                if dist == 0 {
                    return Ok(Lookup {
                        nodes: vec![node],
                        distance: Some(0),
                        visited,
                    });
                }
                if dist < best {
                    nodes.clear();
                    nodes.push(node);
                    best = dist;
                } else if dist == best {
                    nodes.push(node);
                }
            }

            // everything below `child` is exactly `edge` away from `node`, so by the
            // triangle inequality it is at least |edge - dist| away from the query
            for (&edge, child) in node.children.iter() {
                if edge.abs_diff(dist) <= best {
                    stack.push(child);
                }
            }
        }

        let distance = (!nodes.is_empty()).then_some(best);
        Ok(Lookup {
            nodes,
            distance,
            visited,
        })
    }

    ///
    /// Linear scan over every node with the same skip and tie rules as [`BKTree::lookup`].
    ///
    /// Much slower; useful as a reference answer.
    ///
    pub fn lookup_exhaustive<S>(
        &self,
        query: &[Allele],
        skip: &HashSet<E, S>,
    ) -> Result<Lookup<'_, E>>
    where
        E: Eq + Hash,
        S: BuildHasher,
    {
        self.check_dimension(query.len())?;

        let mut nodes: Vec<&BKTreeNode<E>> = Vec::new();
        let mut best = Distance::MAX;
        let mut visited = 0;

        for node in self.iter() {
            visited += 1;
            if node.is_ignorable(skip) {
                continue;
            }
            let dist = self.metric.distance(&node.vector, query);
            if dist < best {
                nodes.clear();
                nodes.push(node);
                best = dist;
            } else if dist == best {
                nodes.push(node);
            }
        }

        let distance = (!nodes.is_empty()).then_some(best);
        Ok(Lookup {
            nodes,
            distance,
            visited,
        })
    }

    /// Depth-first iteration over all nodes, starting at the root.
    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            stack: self.root.iter().collect(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&BKTreeNode<E>, usize)> = self.root.iter().map(|n| (n, 1)).collect();
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.values().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

/// Depth-first iterator over the nodes of a [`BKTree`].
pub struct Iter<'a, E> {
    stack: Vec<&'a BKTreeNode<E>>,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a BKTreeNode<E>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.values());
        Some(node)
    }
}
