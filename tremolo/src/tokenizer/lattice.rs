use crate::dictionary::{Connection, WordId, WordParam, INHIBITED_CONNECTION};

const MAX_COST: i32 = i32::MAX;
const INVALID_IDX: u32 = u32::MAX;

#[derive(Clone, Debug)]
pub struct Node {
    word_id: WordId,
    start_char: u32,
    param: WordParam,
    min_idx: u32,
    min_cost: i32,
}

impl Node {
    #[inline(always)]
    pub const fn word_id(&self) -> WordId {
        self.word_id
    }

    #[inline(always)]
    pub const fn start_char(&self) -> usize {
        self.start_char as usize
    }

    #[inline(always)]
    pub const fn param(&self) -> WordParam {
        self.param
    }

    #[inline(always)]
    pub const fn min_idx(&self) -> usize {
        self.min_idx as usize
    }

    /// Gets the total cost from BOS to the node.
    #[inline(always)]
    pub const fn min_cost(&self) -> i32 {
        self.min_cost
    }

    #[inline(always)]
    pub const fn is_connected_to_bos(&self) -> bool {
        self.min_cost != MAX_COST
    }
}

/// Nodes grouped by their end positions in characters.
#[derive(Default)]
pub struct Lattice {
    ends: Vec<Vec<Node>>,
    eos: Option<Node>,
    len_char: usize,
}

impl Lattice {
    pub fn reset(&mut self, new_len_char: usize) {
        Self::reset_vec(&mut self.ends, new_len_char + 1);
        self.len_char = new_len_char;
        self.eos = None;
        self.insert_bos();
    }

    fn reset_vec<T>(data: &mut Vec<Vec<T>>, new_len: usize) {
        for v in data.iter_mut() {
            v.clear();
        }
        let cur_len = data.len();
        if cur_len <= new_len {
            data.reserve(new_len - cur_len);
            for _ in cur_len..new_len {
                data.push(Vec::with_capacity(16))
            }
        }
    }

    #[inline(always)]
    pub const fn len_char(&self) -> usize {
        self.len_char
    }

    fn insert_bos(&mut self) {
        self.ends[0].push(Node {
            word_id: WordId::from_raw(u32::MAX),
            start_char: u32::MAX,
            param: WordParam::new(-1, 0, 0),
            min_idx: INVALID_IDX,
            min_cost: 0,
        });
    }

    /// Inserts EOS, returning `false` if no path reaches it.
    pub fn insert_eos(&mut self, connection: &Connection) -> bool {
        let len_char = self.len_char();
        let (min_idx, min_cost) = self.search_min_node(len_char, 0, connection);
        self.eos = Some(Node {
            word_id: WordId::from_raw(u32::MAX),
            start_char: len_char as u32,
            param: WordParam::new(0, -1, 0),
            min_idx,
            min_cost,
        });
        min_idx != INVALID_IDX
    }

    pub fn insert_node(
        &mut self,
        start_char: usize,
        end_char: usize,
        word_id: WordId,
        param: WordParam,
        connection: &Connection,
    ) {
        debug_assert!(start_char < end_char);

        let (min_idx, min_cost) =
            self.search_min_node(start_char, param.left_id as usize, connection);
        let min_cost = if min_idx == INVALID_IDX {
            MAX_COST
        } else {
            min_cost + i32::from(param.word_cost)
        };

        self.ends[end_char].push(Node {
            word_id,
            start_char: start_char as u32,
            param,
            min_idx,
            min_cost,
        });
    }

    /// Finds the best predecessor ending at `end_char`.
    ///
    /// Ties keep the node inserted first. Unconnected nodes and inhibited
    /// edges are skipped, and `(INVALID_IDX, MAX_COST)` is returned if nothing
    /// remains.
    fn search_min_node(&self, end_char: usize, left_id: usize, connection: &Connection) -> (u32, i32) {
        let mut min_idx = INVALID_IDX;
        let mut min_cost = MAX_COST;

        for (i, left_node) in self.ends[end_char].iter().enumerate() {
            if !left_node.is_connected_to_bos() {
                continue;
            }
            let conn_cost = connection.cost(left_node.param.right_id as usize, left_id);
            if conn_cost == INHIBITED_CONNECTION {
                continue;
            }
            let new_cost = left_node.min_cost() + i32::from(conn_cost);
            if new_cost < min_cost {
                min_idx = i as u32;
                min_cost = new_cost;
            }
        }

        (min_idx, min_cost)
    }

    /// Checks if a path from BOS reaches position `i`.
    #[inline(always)]
    pub fn has_previous_node(&self, i: usize) -> bool {
        self.ends
            .get(i)
            .map_or(false, |d| d.iter().any(Node::is_connected_to_bos))
    }

    /// Appends the nodes of the best path with their end positions, from the
    /// last to the first.
    pub fn append_top_nodes(&self, top_nodes: &mut Vec<(usize, Node)>) {
        let Some(eos) = self.eos.as_ref() else {
            return;
        };
        if !eos.is_connected_to_bos() {
            return;
        }
        let mut end_char = eos.start_char();
        let mut min_idx = eos.min_idx();
        while end_char != 0 {
            let node = &self.ends[end_char][min_idx];
            top_nodes.push((end_char, node.clone()));
            (end_char, min_idx) = (node.start_char(), node.min_idx());
        }
    }
}

impl std::fmt::Debug for Lattice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lattice {{ eos: {:?}, ends: [", &self.eos)?;
        for (i, e) in self.ends[..=self.len_char].iter().enumerate() {
            writeln!(f, "{} => {:?}", i, e)?;
        }
        writeln!(f, "]}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::dictionary::{ConnectionMatrix, DictionaryBuffer};

    fn connection(matrix: &str) -> Connection {
        let mut m = ConnectionMatrix::new();
        m.read_entries(matrix.as_bytes()).unwrap();
        let data = m.compiled_no_header();
        Connection::new(DictionaryBuffer::from(data), m.left_size(), m.right_size()).unwrap()
    }

    fn word(i: u32) -> WordId {
        WordId::new(0, i).unwrap()
    }

    #[test]
    fn test_tie_keeps_first() {
        let conn = connection("1 1\n0 0 0");
        let mut lattice = Lattice::default();
        lattice.reset(2);
        lattice.insert_node(0, 1, word(0), WordParam::new(0, 0, 5), &conn);
        lattice.insert_node(0, 1, word(1), WordParam::new(0, 0, 5), &conn);
        lattice.insert_node(1, 2, word(2), WordParam::new(0, 0, 1), &conn);
        assert!(lattice.insert_eos(&conn));

        let mut top_nodes = vec![];
        lattice.append_top_nodes(&mut top_nodes);
        assert_eq!(top_nodes.len(), 2);
        assert_eq!(top_nodes[0].1.word_id(), word(2));
        assert_eq!(top_nodes[1].1.word_id(), word(0));
        assert_eq!(top_nodes[0].1.min_cost(), 6);
    }

    #[test]
    fn test_inhibited() {
        let conn = connection("2 2\n0 0 0\n0 1 32767\n1 0 0\n1 1 0");
        let mut lattice = Lattice::default();
        lattice.reset(1);
        // BOS has right id 0 and edge (0, 1) is inhibited.
        lattice.insert_node(0, 1, word(0), WordParam::new(1, 0, 0), &conn);
        assert!(!lattice.has_previous_node(1));
        assert!(!lattice.insert_eos(&conn));

        let mut top_nodes = vec![];
        lattice.append_top_nodes(&mut top_nodes);
        assert!(top_nodes.is_empty());
    }

    #[test]
    fn test_connection_cost() {
        let conn = connection("2 2\n0 0 10\n0 1 20\n1 0 30\n1 1 40");
        let mut lattice = Lattice::default();
        lattice.reset(2);
        lattice.insert_node(0, 1, word(0), WordParam::new(1, 1, 3), &conn);
        lattice.insert_node(1, 2, word(1), WordParam::new(0, 0, 4), &conn);
        assert!(lattice.insert_eos(&conn));

        let mut top_nodes = vec![];
        lattice.append_top_nodes(&mut top_nodes);
        // BOS(0)->w0: 20 + 3, w0(1)->w1: 30 + 4, w1(0)->EOS: 10
        assert_eq!(top_nodes[1].1.min_cost(), 23);
        assert_eq!(top_nodes[0].1.min_cost(), 57);
    }
}
