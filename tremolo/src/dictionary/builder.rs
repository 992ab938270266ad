use std::io::{Read, Write};

use crate::codec::ByteWriter;
use crate::dictionary::description::{BLOCK_ALIGNMENT, HEADER_SIZE};
use crate::dictionary::lexicon::{CompiledLexicon, LexiconCompiler, Target};
use crate::dictionary::{
    BlockInfo, ConnectionMatrix, Description, Dictionary, DictionaryBuffer, DictionaryKind,
    PosTable, BLOCK_CONNECTION, BLOCK_INDEX, BLOCK_POS, BLOCK_STRINGS, BLOCK_WORDS,
};
use crate::errors::{Result, TremoloError};

/// Lays out the blocks after the header and signs them.
fn assemble(mut description: Description, blocks: Vec<(&str, Vec<u8>)>) -> Result<Vec<u8>> {
    let mut payload = ByteWriter::new();
    for (name, data) in blocks {
        payload.align(BLOCK_ALIGNMENT);
        let start = HEADER_SIZE + payload.len();
        log::debug!("writing block {name} ({} bytes) at {start}", data.len());
        description.blocks.push(BlockInfo {
            name: name.to_string(),
            start: u64::try_from(start)?,
            size: u64::try_from(data.len())?,
        });
        payload.write_bytes(&data);
    }
    let payload = payload.into_inner();
    description.signature = Description::compute_signature(&payload);
    let mut data = description.write()?;
    data.extend_from_slice(&payload);
    Ok(data)
}

fn lexicon_blocks(
    description: &mut Description,
    lexicon: CompiledLexicon,
) -> [(&'static str, Vec<u8>); 3] {
    description.num_indexed_entries = lexicon.num_indexed;
    description.num_total_entries = lexicon.num_total;
    [
        (BLOCK_INDEX, lexicon.index),
        (BLOCK_STRINGS, lexicon.strings),
        (BLOCK_WORDS, lexicon.words),
    ]
}

/// Builder of a system dictionary from a connection matrix and lexicon CSVs.
pub struct SystemDictionaryBuilder {
    comment: String,
    matrix: Option<ConnectionMatrix>,
    compiler: LexiconCompiler<'static>,
}

impl Default for SystemDictionaryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemDictionaryBuilder {
    pub fn new() -> Self {
        Self {
            comment: String::new(),
            matrix: None,
            compiler: LexiconCompiler::new(Target::System, PosTable::new()),
        }
    }

    /// Creates a builder from a matrix and a lexicon.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when an input format is invalid.
    pub fn from_readers<M, L>(matrix_rdr: M, lexicon_rdr: L) -> Result<Self>
    where
        M: Read,
        L: Read,
    {
        let mut builder = Self::new();
        builder.read_matrix(matrix_rdr)?;
        builder.read_lexicon(lexicon_rdr)?;
        Ok(builder)
    }

    /// Sets a free-form comment stored in the header.
    pub fn comment<S>(mut self, comment: S) -> Self
    where
        S: Into<String>,
    {
        self.comment = comment.into();
        self
    }

    /// Reads a connection matrix, returning the number of costs.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the format is invalid or the number of
    /// costs differs from the size in the header.
    pub fn read_matrix<R>(&mut self, rdr: R) -> Result<usize>
    where
        R: Read,
    {
        let mut matrix = ConnectionMatrix::new();
        let num_entries = matrix.read_entries(rdr)?;
        let expected = matrix.left_size() * matrix.right_size();
        if num_entries != expected {
            return Err(TremoloError::invalid_format(
                "matrix.def",
                format!("{num_entries} costs are given but the matrix has {expected} cells"),
            ));
        }
        self.matrix = Some(matrix);
        Ok(num_entries)
    }

    /// Reads a lexicon CSV, returning the number of rows. Several lexicons can
    /// be read in turn, and references count words across all of them.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when a row is invalid.
    pub fn read_lexicon<R>(&mut self, rdr: R) -> Result<usize>
    where
        R: Read,
    {
        self.compiler.read_lexicon(rdr)
    }

    /// Builds the binary dictionary.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when no matrix has been read or a context
    /// id is out of the matrix.
    pub fn build(&self) -> Result<Vec<u8>> {
        let matrix = self.matrix.as_ref().ok_or_else(|| {
            TremoloError::invalid_argument("matrix", "no connection matrix has been read")
        })?;
        let lexicon = self.compiler.compile(matrix.left_size(), matrix.right_size())?;

        let mut pos = ByteWriter::new();
        self.compiler.pos_table().write(&mut pos)?;
        let mut connection = ByteWriter::new();
        connection.write_u16(u16::try_from(matrix.left_size())?);
        connection.write_u16(u16::try_from(matrix.right_size())?);
        connection.write_bytes(&matrix.compiled_no_header());

        let mut description = Description::new(DictionaryKind::System);
        description.comment = self.comment.clone();
        let mut blocks = vec![
            (BLOCK_POS, pos.into_inner()),
            (BLOCK_CONNECTION, connection.into_inner()),
        ];
        blocks.extend(lexicon_blocks(&mut description, lexicon));
        assemble(description, blocks)
    }

    /// Writes the binary dictionary, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// See [`SystemDictionaryBuilder::build()`].
    pub fn write<W>(&self, mut wtr: W) -> Result<usize>
    where
        W: Write,
    {
        let data = self.build()?;
        wtr.write_all(&data)?;
        Ok(data.len())
    }

    /// Builds and loads the dictionary without going through a file.
    ///
    /// # Errors
    ///
    /// See [`SystemDictionaryBuilder::build()`].
    pub fn into_dictionary(self) -> Result<Dictionary> {
        Dictionary::load_system(DictionaryBuffer::from(self.build()?))
    }
}

/// Builder of a user dictionary on top of a loaded system dictionary.
///
/// Plain numeric references point to system words and `U<n>` references point
/// to words of the user dictionary itself.
pub struct UserDictionaryBuilder<'a> {
    comment: String,
    system: &'a Dictionary,
    compiler: LexiconCompiler<'a>,
}

impl<'a> UserDictionaryBuilder<'a> {
    /// Creates a builder. New POS get ids following the system POS.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when the POS of the system dictionary
    /// cannot be registered.
    pub fn new(system: &'a Dictionary) -> Result<Self> {
        let mut pos_table = PosTable::new();
        pos_table.preload(system.system_pos())?;
        Ok(Self {
            comment: String::new(),
            system,
            compiler: LexiconCompiler::new(Target::User(system), pos_table),
        })
    }

    /// Sets a free-form comment stored in the header.
    pub fn comment<S>(mut self, comment: S) -> Self
    where
        S: Into<String>,
    {
        self.comment = comment.into();
        self
    }

    /// Reads a lexicon CSV, returning the number of rows.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when a row is invalid.
    pub fn read_lexicon<R>(&mut self, rdr: R) -> Result<usize>
    where
        R: Read,
    {
        self.compiler.read_lexicon(rdr)
    }

    /// Builds the binary dictionary.
    ///
    /// # Errors
    ///
    /// [`TremoloError`] is returned when a context id is out of the matrix of
    /// the system dictionary.
    pub fn build(&self) -> Result<Vec<u8>> {
        let connection = self.system.connection();
        let lexicon = self
            .compiler
            .compile(connection.left_size(), connection.right_size())?;

        let mut pos = ByteWriter::new();
        self.compiler.pos_table().write(&mut pos)?;

        let mut description = Description::new(DictionaryKind::User);
        description.comment = self.comment.clone();
        description.reference = self.system.description().signature.clone();
        let mut blocks = vec![(BLOCK_POS, pos.into_inner())];
        blocks.extend(lexicon_blocks(&mut description, lexicon));
        assemble(description, blocks)
    }

    /// Writes the binary dictionary, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// See [`UserDictionaryBuilder::build()`].
    pub fn write<W>(&self, mut wtr: W) -> Result<usize>
    where
        W: Write,
    {
        let data = self.build()?;
        wtr.write_all(&data)?;
        Ok(data.len())
    }
}
