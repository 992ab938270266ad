use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use crate::errors::{Result, TremoloError};
use crate::utils::FromU32;

/// The maximum number of categories, bounded by the width of the category set.
pub const MAX_CATEGORIES: usize = u32::BITS as usize;

/// The maximum value of LENGTH.
pub const MAX_CATEGORY_LENGTH: u16 = 15;

const BMP_SIZE: usize = 0x10000;
const CHAR_END: u32 = char::MAX as u32 + 1;

const FLAG_INVOKE: u8 = 1;
const FLAG_GROUP: u8 = 2;

/// Categories of a character and the behavior of its primary category.
///
/// The primary category is the first one listed for the character in
/// `char.def`. Its INVOKE, GROUP and LENGTH settings apply.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CharInfo {
    categories: u32,
    primary: u8,
    flags: u8,
    length: u8,
}

impl CharInfo {
    /// Bit set of the category ids the character belongs to.
    #[inline(always)]
    pub const fn category_set(&self) -> u32 {
        self.categories
    }

    #[inline(always)]
    pub const fn primary_category(&self) -> u32 {
        self.primary as u32
    }

    /// Whether OOV words are generated even if dictionary words start here.
    #[inline(always)]
    pub const fn invoke(&self) -> bool {
        self.flags & FLAG_INVOKE != 0
    }

    /// Whether a run of characters sharing a category becomes one word.
    #[inline(always)]
    pub const fn group(&self) -> bool {
        self.flags & FLAG_GROUP != 0
    }

    /// Lengths `1..=length` are also generated.
    #[inline(always)]
    pub const fn length(&self) -> u16 {
        self.length as u16
    }

    #[inline(always)]
    const fn shares_category(&self, other: &Self) -> bool {
        self.categories & other.categories != 0
    }
}

/// A category line of `char.def`.
struct CategoryDef {
    name: String,
    invoke: bool,
    group: bool,
    length: u16,
}

/// Mapping from characters to their categories, read from `char.def`.
///
/// Lookups for the BMP go through a flat table. Ranges beyond it are
/// scanned, later definitions first.
pub struct CharProperty {
    bmp: Vec<CharInfo>,
    supplementary: Vec<(u32, u32, CharInfo)>,
    default: CharInfo,
    names: Vec<String>,
}

impl CharProperty {
    /// Gets the categories of `c`. Characters in no range get `DEFAULT`.
    #[inline(always)]
    pub fn char_info(&self, c: char) -> CharInfo {
        let code = u32::from(c);
        if let Some(&info) = self.bmp.get(usize::from_u32(code)) {
            return info;
        }
        self.supplementary
            .iter()
            .rev()
            .find(|&&(start, end, _)| start <= code && code < end)
            .map_or(self.default, |&(_, _, info)| info)
    }

    /// Gets the id of the category named `name`.
    pub fn category_id(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|id| u32::try_from(id).ok())
    }

    #[inline(always)]
    pub fn num_categories(&self) -> usize {
        self.names.len()
    }

    /// Checks if the characters at `lhs` and `rhs` can be grouped.
    #[inline(always)]
    pub(crate) const fn groupable(lhs: &CharInfo, rhs: &CharInfo) -> bool {
        lhs.shares_category(rhs)
    }

    /// Reads `char.def`.
    ///
    /// Category lines are `NAME INVOKE GROUP LENGTH`. Range lines are
    /// `0xSTART[..0xEND] NAME [NAME ...]`, and text after `#` is ignored.
    /// `DEFAULT` must be defined.
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut defs: Vec<CategoryDef> = vec![];
        let mut ids: HashMap<String, u8> = HashMap::new();
        let mut ranges: Vec<(u32, u32, Vec<String>)> = vec![];

        for (i, line) in BufReader::new(rdr).lines().enumerate() {
            let line = line?;
            let body = line.split('#').next().unwrap_or_default().trim();
            if body.is_empty() {
                continue;
            }
            let cols: Vec<_> = body.split_whitespace().collect();
            if cols[0].starts_with("0x") {
                ranges.push(parse_range(i + 1, &cols)?);
                continue;
            }
            let def = parse_category(i + 1, &cols)?;
            match ids.get(&def.name) {
                Some(&id) => defs[usize::from(id)] = def,
                None => {
                    if defs.len() == MAX_CATEGORIES {
                        let msg = format!("line {}: more than {MAX_CATEGORIES} categories", i + 1);
                        return Err(TremoloError::invalid_format("char.def", msg));
                    }
                    ids.insert(def.name.clone(), u8::try_from(defs.len())?);
                    defs.push(def);
                }
            }
        }

        let resolve = |names: &[String]| -> Result<CharInfo> {
            let mut info = CharInfo::default();
            for (k, name) in names.iter().enumerate() {
                let &id = ids.get(name).ok_or_else(|| {
                    TremoloError::invalid_format("char.def", format!("undefined category {name}"))
                })?;
                info.categories |= 1 << id;
                if k == 0 {
                    let def = &defs[usize::from(id)];
                    info.primary = id;
                    info.flags =
                        (u8::from(def.invoke) * FLAG_INVOKE) | (u8::from(def.group) * FLAG_GROUP);
                    info.length = u8::try_from(def.length)?;
                }
            }
            Ok(info)
        };

        let default = resolve(&["DEFAULT".to_string()])?;
        let mut bmp = vec![default; BMP_SIZE];
        let mut supplementary = vec![];
        for (start, end, names) in &ranges {
            let info = resolve(names)?;
            let bmp_end = usize::from_u32(*end).min(BMP_SIZE);
            for e in bmp.iter_mut().take(bmp_end).skip(usize::from_u32(*start)) {
                *e = info;
            }
            if usize::from_u32(*end) > BMP_SIZE {
                supplementary.push(((*start).max(BMP_SIZE as u32), *end, info));
            }
        }

        Ok(Self {
            bmp,
            supplementary,
            default,
            names: defs.into_iter().map(|d| d.name).collect(),
        })
    }
}

fn parse_category(lineno: usize, cols: &[&str]) -> Result<CategoryDef> {
    if cols.len() < 4 {
        let msg = format!("line {lineno}: a category needs NAME INVOKE GROUP LENGTH");
        return Err(TremoloError::invalid_format("char.def", msg));
    }
    let flag = |name: &str, col: &str| match col {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => {
            let msg = format!("line {lineno}: {name} must be 0 or 1, got {col}");
            Err(TremoloError::invalid_format("char.def", msg))
        }
    };
    let length = cols[3]
        .parse::<u16>()
        .ok()
        .filter(|&l| l <= MAX_CATEGORY_LENGTH)
        .ok_or_else(|| {
            let msg = format!(
                "line {lineno}: LENGTH must be in 0..={MAX_CATEGORY_LENGTH}, got {}",
                cols[3]
            );
            TremoloError::invalid_format("char.def", msg)
        })?;
    Ok(CategoryDef {
        name: cols[0].to_string(),
        invoke: flag("INVOKE", cols[1])?,
        group: flag("GROUP", cols[2])?,
        length,
    })
}

fn parse_range(lineno: usize, cols: &[&str]) -> Result<(u32, u32, Vec<String>)> {
    if cols.len() < 2 {
        let msg = format!("line {lineno}: a range needs at least one category");
        return Err(TremoloError::invalid_format("char.def", msg));
    }
    let code = |s: &str| {
        s.strip_prefix("0x")
            .and_then(|h| u32::from_str_radix(h, 16).ok())
            .ok_or_else(|| {
                TremoloError::invalid_format("char.def", format!("line {lineno}: bad code point {s}"))
            })
    };
    let (start, last) = match cols[0].split_once("..") {
        Some((s, e)) => (code(s)?, code(e)?),
        None => {
            let c = code(cols[0])?;
            (c, c)
        }
    };
    if start > last || last >= CHAR_END {
        let msg = format!("line {lineno}: invalid range {}", cols[0]);
        return Err(TremoloError::invalid_format("char.def", msg));
    }
    let names = cols[1..].iter().map(|s| s.to_string()).collect();
    Ok((start, last + 1, names))
}
