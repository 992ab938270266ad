use crate::dictionary::{Dictionary, Pos, WordParam, POS_DEPTH};
use crate::errors::{Result, TremoloError};
use crate::oov::{resolve_param, CharInfo, CharProperty, FoundLengths, OovWord};
use crate::sentence::Sentence;
use crate::utils::{self, FromU32};

/// Parameters of [`MecabOov`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MecabOovConfig {
    /// Contents of `char.def`.
    pub char_def: String,
    /// Contents of `unk.def`.
    pub unk_def: String,
    /// Grouped words longer than this are not generated. `None` means no limit.
    pub max_grouping_len: Option<usize>,
}

#[derive(Clone, Copy, Debug)]
struct UnkEntry {
    param: WordParam,
    pos_id: u16,
}

/// Provider of words grouped by character categories.
pub struct MecabOov {
    char_prop: CharProperty,
    offsets: Vec<usize>, // indexed by category id
    entries: Vec<UnkEntry>,
    max_grouping_len: usize,
}

impl MecabOov {
    pub(crate) fn new(config: &MecabOovConfig, dict: &Dictionary) -> Result<Self> {
        let char_prop = CharProperty::from_reader(config.char_def.as_bytes())?;

        let mut map = vec![vec![]; char_prop.num_categories()];
        for (i, line) in config.unk_def.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let cols = utils::parse_csv_row(line)?;
            if cols.len() < 4 + POS_DEPTH {
                let msg = format!("line {}: {} columns are required", i + 1, 4 + POS_DEPTH);
                return Err(TremoloError::invalid_format("unk.def", msg));
            }
            let cate_id = char_prop.category_id(&cols[0]).ok_or_else(|| {
                let msg = format!("line {}: undefined category {}", i + 1, cols[0]);
                TremoloError::invalid_format("unk.def", msg)
            })?;
            let parse_i16 = |s: &str| {
                s.trim().parse::<i16>().map_err(|e| {
                    let msg = format!("line {}: {s}: {e}", i + 1);
                    TremoloError::invalid_format("unk.def", msg)
                })
            };
            let left_id = parse_i16(&cols[1])?;
            let right_id = parse_i16(&cols[2])?;
            let cost = parse_i16(&cols[3])?;
            let pos = Pos::new(&cols[4..4 + POS_DEPTH])?;
            let (param, pos_id) = resolve_param(dict, &pos, left_id, right_id, cost)?;
            map[usize::from_u32(cate_id)].push(UnkEntry { param, pos_id });
        }

        let mut offsets = vec![];
        let mut entries = vec![];
        for mut v in map {
            offsets.push(entries.len());
            entries.append(&mut v);
        }
        offsets.push(entries.len());

        Ok(Self {
            char_prop,
            offsets,
            entries,
            max_grouping_len: config.max_grouping_len.unwrap_or(usize::MAX),
        })
    }

    #[inline(always)]
    pub(crate) const fn char_prop(&self) -> &CharProperty {
        &self.char_prop
    }

    pub(crate) fn provide(
        &self,
        sent: &Sentence,
        start_char: usize,
        found: &FoundLengths,
        out: &mut Vec<OovWord>,
    ) {
        let cinfo = sent.char_info(start_char);
        let mut has_matched = !found.is_empty();
        if has_matched && !cinfo.invoke() {
            return;
        }

        let mut grouped = false;
        let groupable = sent.groupable(start_char);

        if cinfo.group() {
            grouped = true;
            if groupable <= self.max_grouping_len {
                self.scan_entries(start_char + groupable, cinfo, out);
                has_matched = true;
            }
        }

        for i in 1..=usize::from(cinfo.length()).min(groupable) {
            if grouped && i == groupable {
                continue;
            }
            self.scan_entries(start_char + i, cinfo, out);
            has_matched = true;
        }

        // Generates at least one word.
        if !has_matched {
            self.scan_entries(start_char + 1, cinfo, out);
        }
    }

    #[inline(always)]
    fn scan_entries(&self, end_char: usize, cinfo: CharInfo, out: &mut Vec<OovWord>) {
        let cate_id = usize::from_u32(cinfo.primary_category());
        let start = self.offsets[cate_id];
        let end = self.offsets[cate_id + 1];
        for e in &self.entries[start..end] {
            out.push(OovWord {
                end_char,
                param: e.param,
                pos_id: e.pos_id,
            });
        }
    }
}
