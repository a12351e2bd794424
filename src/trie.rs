//! Reverse instruction trie for exact-match gadget lookup.
//!
//! Every position of the instruction stream is inserted as the sequence of
//! instructions read *backwards* from it. A gadget is usually anchored on its
//! final instruction (a `ret`, a `bx lr`, ...) and extended towards lower
//! addresses, so walking the query from its last instruction turns that
//! backward extension into a plain prefix walk.
//!
//! Each node records, in insertion order, the stream positions of the first
//! instruction of every sequence that reaches it. Insertion follows file
//! order, so the first record is always the lowest-offset occurrence.
//!
//! Insertion depth is bounded by `max_depth` to keep the index linear in the
//! stream length. Longer queries walk the trie for their last `max_depth`
//! instructions and check the remaining ones directly against the stream, so
//! the result does not depend on the bound.

use std::collections::HashMap;

use crate::isa::Isa;
use crate::{Address, ExeError, Instruction};

/// Default bound on the number of instructions indexed per stream position
pub const DEFAULT_MAX_DEPTH: usize = 8;

const ROOT: usize = 0;

#[derive(Debug, Default)]
struct TrieNode {
    /// Opcode hex of the next (earlier) instruction -> node index
    children: HashMap<String, usize>,
    /// Stream positions where a matching sequence begins
    starts: Vec<usize>,
}

/// Prefix tree over reversed instruction sequences.
///
/// Built once by [`ReverseInstructionTrie::build`] and read-only afterwards.
#[derive(Debug)]
pub struct ReverseInstructionTrie {
    nodes: Vec<TrieNode>,
    stream: Vec<Instruction>,
    max_depth: usize,
}

impl ReverseInstructionTrie {
    /// Index `stream`, inserting at most `max_depth` instructions per position.
    pub fn build(stream: Vec<Instruction>, max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        let mut nodes = vec![TrieNode::default()];

        for end in 0..stream.len() {
            let depth = max_depth.min(end + 1);
            let mut node = ROOT;

            for start in (end + 1 - depth..=end).rev() {
                let opcode = &stream[start].opcode;
                let existing = nodes[node].children.get(opcode).copied();
                node = match existing {
                    Some(child) => child,
                    None => {
                        let child = nodes.len();
                        nodes.push(TrieNode::default());
                        nodes[node].children.insert(opcode.clone(), child);
                        child
                    }
                };
                nodes[node].starts.push(start);
            }
        }

        log::debug!(
            "Built reverse instruction trie: {} instructions, {} nodes, depth {}",
            stream.len(),
            nodes.len(),
            max_depth
        );

        Self {
            nodes,
            stream,
            max_depth,
        }
    }

    /// Number of indexed instructions
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Number of trie nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The indexed instruction stream, in file order
    pub fn instructions(&self) -> &[Instruction] {
        &self.stream
    }

    /// Virtual address of the first occurrence of `gadget`.
    ///
    /// `gadget` is hex encoded machine code in file byte order: on a
    /// big-endian image the bytes must be given as they appear in the file,
    /// not as the instruction's integer value. `isa` must be the ISA the
    /// stream was built for. When the sequence occurs more than once the
    /// lowest file offset wins.
    pub fn find(&self, gadget: &str, isa: Isa) -> Result<Address, ExeError> {
        let groups = split_gadget(gadget, isa.instruction_size())?;
        let first = self.matches(&groups).next();
        first
            .map(|start| self.stream[start].vaddr)
            .ok_or(ExeError::NotFound)
    }

    /// Virtual addresses of every occurrence of `gadget`, in file order.
    pub fn find_all(&self, gadget: &str, isa: Isa) -> Result<Vec<Address>, ExeError> {
        let groups = split_gadget(gadget, isa.instruction_size())?;
        let addresses: Vec<Address> = self
            .matches(&groups)
            .map(|start| self.stream[start].vaddr)
            .collect();
        if addresses.is_empty() {
            return Err(ExeError::NotFound);
        }
        Ok(addresses)
    }

    /// Stream positions at which `groups` begins, in file order.
    fn matches<'a>(&'a self, groups: &'a [String]) -> impl Iterator<Item = usize> + 'a {
        let prefix = &groups[..groups.len().saturating_sub(self.max_depth)];
        self.walk(groups)
            .into_iter()
            .flat_map(move |node| self.nodes[node].starts.iter().copied())
            .filter_map(move |start| self.extend_backwards(start, prefix))
    }

    /// Follow the last `max_depth` groups from the root, last group first.
    fn walk(&self, groups: &[String]) -> Option<usize> {
        groups
            .iter()
            .rev()
            .take(self.max_depth)
            .try_fold(ROOT, |node, group| self.nodes[node].children.get(group).copied())
    }

    /// Check the instructions preceding `start` against `prefix`.
    fn extend_backwards(&self, start: usize, prefix: &[String]) -> Option<usize> {
        let begin = start.checked_sub(prefix.len())?;
        self.stream[begin..start]
            .iter()
            .zip(prefix)
            .all(|(insn, group)| insn.opcode == *group)
            .then_some(begin)
    }
}

/// Split hex text into instruction-width groups of lowercase hex.
fn split_gadget(gadget: &str, instruction_size: usize) -> Result<Vec<String>, ExeError> {
    let bytes = hex::decode(gadget).map_err(|_| ExeError::MalformedGadget(gadget.to_string()))?;
    if bytes.is_empty() || bytes.len() % instruction_size != 0 {
        return Err(ExeError::NotFound);
    }
    Ok(bytes.chunks(instruction_size).map(hex::encode).collect())
}
