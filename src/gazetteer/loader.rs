//! Reading the gazetteer source file.
//!
//! The source is a semicolon-delimited export with a fixed column set and
//! no declared encoding. It is decoded by trying each [`SourceEncoding`] in
//! turn; the first strict decode that succeeds wins.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::record::{RecordFields, ReferenceRecord};
use crate::normalize::collapse_whitespace;

use super::snapshot;
use super::store::{GazetteerError, ReferenceIndex};

/// Extension appended to the source file name for the default snapshot path
pub const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Text encodings the source may be stored in, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1251,
    Windows1252,
}

impl SourceEncoding {
    pub const CANDIDATES: [SourceEncoding; 3] = [
        SourceEncoding::Utf8,
        SourceEncoding::Windows1251,
        SourceEncoding::Windows1252,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        self.encoding().name()
    }

    fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            SourceEncoding::Utf8 => encoding_rs::UTF_8,
            SourceEncoding::Windows1251 => encoding_rs::WINDOWS_1251,
            SourceEncoding::Windows1252 => encoding_rs::WINDOWS_1252,
        }
    }

    /// Strict decode: `None` if any byte sequence is invalid in this encoding
    fn decode(self, bytes: &[u8]) -> Option<String> {
        let bytes = match self {
            SourceEncoding::Utf8 => bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
            _ => bytes,
        };
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(std::borrow::Cow::into_owned)
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode `bytes` with the first candidate encoding that accepts them
#[must_use]
pub fn decode_source(bytes: &[u8]) -> Option<(String, SourceEncoding)> {
    SourceEncoding::CANDIDATES
        .iter()
        .find_map(|&encoding| encoding.decode(bytes).map(|text| (text, encoding)))
}

/// Gazetteer columns, identified by their (whitespace-insensitive) header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Region,
    OldDistrict,
    NewDistrict,
    Otg,
    City,
    PostalIndex,
    Street,
    Buildings,
    SortCenter1,
    SortCenter2,
    DeliveryDistrict,
    TechIndex,
    Features,
    NotWorking,
}

impl Column {
    const ALL: [Column; 14] = [
        Column::Region,
        Column::OldDistrict,
        Column::NewDistrict,
        Column::Otg,
        Column::City,
        Column::PostalIndex,
        Column::Street,
        Column::Buildings,
        Column::SortCenter1,
        Column::SortCenter2,
        Column::DeliveryDistrict,
        Column::TechIndex,
        Column::Features,
        Column::NotWorking,
    ];

    fn header(self) -> &'static str {
        match self {
            Column::Region => "Область",
            Column::OldDistrict => "Адміністративний район(старий)",
            Column::NewDistrict => "Адміністративний район(новий)",
            Column::Otg => "Найменування ОТГ(довідково)",
            Column::City => "Населений пункт",
            Column::PostalIndex => "Індекс НП",
            Column::Street => "Назва вулиці",
            Column::Buildings => "№ будинку",
            Column::SortCenter1 => "сортувальний центр 1 рівня",
            Column::SortCenter2 => "сортувальний центр 2 рівня",
            Column::DeliveryDistrict => "Адміністративний район доставки(вручення)",
            Column::TechIndex => "Технологічний індекс ОПЗ доставки(вручення)",
            Column::Features => "Особливості функціонування ВПЗ",
            Column::NotWorking => "Тимчасово не функціонує",
        }
    }

    /// A source without this column cannot be indexed at all
    fn required(self) -> bool {
        matches!(self, Column::City)
    }
}

fn header_key(header: &str) -> String {
    collapse_whitespace(header).to_lowercase()
}

/// Column positions resolved from a header row
struct ColumnMap {
    positions: HashMap<Column, usize>,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, GazetteerError> {
        let by_key: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (header_key(h), i))
            .collect();

        let mut positions = HashMap::new();
        for column in Column::ALL {
            match by_key.get(&header_key(column.header())) {
                Some(&i) => {
                    positions.insert(column, i);
                }
                None if column.required() => {
                    return Err(GazetteerError::MissingColumn(column.header().to_string()));
                }
                None => debug!("Gazetteer has no '{}' column", column.header()),
            }
        }

        Ok(Self { positions })
    }

    /// Value of `column` in `row`; `None` when the row is too short to have it
    fn get<'r>(&self, row: &'r csv::StringRecord, column: Column) -> Option<&'r str> {
        self.positions.get(&column).and_then(|&i| row.get(i))
    }

    /// Like [`ColumnMap::get`], but columns absent from the header read as empty
    fn get_or_empty(&self, row: &csv::StringRecord, column: Column) -> String {
        self.get(row, column).unwrap_or_default().to_string()
    }

    fn to_record(&self, row: &csv::StringRecord) -> Option<ReferenceRecord> {
        let city = self.get(row, Column::City)?;

        Some(ReferenceRecord::new(RecordFields {
            region: self.get_or_empty(row, Column::Region),
            old_district: self.get_or_empty(row, Column::OldDistrict),
            new_district: self.get_or_empty(row, Column::NewDistrict),
            otg: self.get_or_empty(row, Column::Otg),
            city: city.to_string(),
            postal_index: self.get_or_empty(row, Column::PostalIndex),
            street: self.get_or_empty(row, Column::Street),
            buildings: self.get_or_empty(row, Column::Buildings),
            sort_center_1: self.get_or_empty(row, Column::SortCenter1),
            sort_center_2: self.get_or_empty(row, Column::SortCenter2),
            delivery_district: self.get_or_empty(row, Column::DeliveryDistrict),
            tech_index: self.get_or_empty(row, Column::TechIndex),
            features: self.get_or_empty(row, Column::Features),
            not_working: self.get_or_empty(row, Column::NotWorking),
        }))
    }
}

/// Records parsed from decoded source text
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub records: Vec<ReferenceRecord>,
    /// Rows dropped because they were unreadable or lacked the city column
    pub skipped_rows: usize,
}

/// Parse decoded gazetteer text into records.
///
/// # Errors
///
/// Returns an error if the header row cannot be read or lacks a required
/// column. Malformed data rows are skipped and counted instead.
pub fn parse_gazetteer_text(text: &str) -> Result<ParsedSource, GazetteerError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = ColumnMap::resolve(reader.headers()?)?;
    let mut parsed = ParsedSource::default();

    for (line, row) in reader.records().enumerate() {
        match row {
            Ok(row) => match columns.to_record(&row) {
                Some(record) => parsed.records.push(record),
                None => {
                    warn!("Skipping gazetteer row {}: missing settlement column", line + 2);
                    parsed.skipped_rows += 1;
                }
            },
            Err(e) => {
                warn!("Skipping gazetteer row {}: {e}", line + 2);
                parsed.skipped_rows += 1;
            }
        }
    }

    Ok(parsed)
}

/// Where a loaded index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Snapshot,
    Source {
        encoding: SourceEncoding,
        skipped_rows: usize,
    },
}

impl fmt::Display for LoadOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOrigin::Snapshot => write!(f, "snapshot"),
            LoadOrigin::Source {
                encoding,
                skipped_rows,
            } => write!(f, "source ({encoding}, {skipped_rows} rows skipped)"),
        }
    }
}

/// A loaded index together with how it was obtained
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub index: ReferenceIndex,
    pub origin: LoadOrigin,
}

/// Loads the gazetteer from its source file, going through a binary
/// snapshot when a usable one exists.
#[derive(Debug, Clone)]
pub struct GazetteerLoader {
    source: PathBuf,
    cache: PathBuf,
}

impl GazetteerLoader {
    /// Loader for `source`, caching next to it as `<source>.snapshot`
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let cache = Self::default_cache_path(&source);
        Self { source, cache }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: impl Into<PathBuf>) -> Self {
        self.cache = cache.into();
        self
    }

    #[must_use]
    pub fn default_cache_path(source: &Path) -> PathBuf {
        let mut name = source.as_os_str().to_owned();
        name.push(".");
        name.push(SNAPSHOT_EXTENSION);
        PathBuf::from(name)
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    #[must_use]
    pub fn cache(&self) -> &Path {
        &self.cache
    }

    /// Load the index.
    ///
    /// Unless `force_reload` is set, a valid snapshot is used as is. A
    /// snapshot that cannot be read is deleted and the source is parsed
    /// instead. After a source parse the snapshot is replaced atomically;
    /// failing to write it is only a warning. A forced reload leaves the
    /// existing snapshot in place until the source has parsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read, decoded, or parsed.
    pub fn load(&self, force_reload: bool) -> Result<LoadOutcome, GazetteerError> {
        if force_reload {
            debug!("Forced reload, bypassing snapshot {}", self.cache.display());
        } else {
            match snapshot::read_snapshot(&self.cache) {
                Ok(Some(index)) => {
                    info!(
                        "Loaded {} gazetteer records from snapshot {}",
                        index.len(),
                        self.cache.display()
                    );
                    return Ok(LoadOutcome {
                        index,
                        origin: LoadOrigin::Snapshot,
                    });
                }
                Ok(None) => debug!("No snapshot at {}", self.cache.display()),
                Err(e) => {
                    warn!("Discarding snapshot {}: {e}", self.cache.display());
                    self.discard_snapshot();
                }
            }
        }

        let outcome = self.load_from_source()?;

        match snapshot::write_snapshot(&self.cache, &outcome.index) {
            Ok(()) => debug!("Wrote snapshot {}", self.cache.display()),
            Err(e) => warn!("Failed to write snapshot {}: {e}", self.cache.display()),
        }

        Ok(outcome)
    }

    /// Parse the source file, ignoring any snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, no candidate encoding
    /// decodes it, or its header lacks a required column.
    pub fn load_from_source(&self) -> Result<LoadOutcome, GazetteerError> {
        let bytes = std::fs::read(&self.source)?;

        let (text, encoding) =
            decode_source(&bytes).ok_or_else(|| GazetteerError::UndecodableSource {
                path: self.source.display().to_string(),
                tried: SourceEncoding::CANDIDATES
                    .iter()
                    .map(|e| e.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        info!("Decoded {} as {encoding}", self.source.display());

        let parsed = parse_gazetteer_text(&text)?;
        let index = ReferenceIndex::from_records(parsed.records);

        let stats = index.stats();
        info!(
            "Loaded {} gazetteer records ({} skipped), {} city prefixes, {} regions",
            stats.total_records, parsed.skipped_rows, stats.indexed_prefixes, stats.indexed_regions
        );

        Ok(LoadOutcome {
            index,
            origin: LoadOrigin::Source {
                encoding,
                skipped_rows: parsed.skipped_rows,
            },
        })
    }

    fn discard_snapshot(&self) {
        match std::fs::remove_file(&self.cache) {
            Ok(()) => debug!("Removed snapshot {}", self.cache.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove snapshot {}: {e}", self.cache.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Область; Адміністративний район(старий); Адміністративний район(новий); \
        Найменування ОТГ(довідково); Населений пункт; Індекс НП; Назва вулиці;№ будинку;  \
        сортувальний центр 1 рівня; сортувальний центр 2 рівня; \
        Адміністративний район доставки(вручення); Технологічний індекс ОПЗ доставки(вручення);\
        Особливості функціонування ВПЗ;Тимчасово не функціонує";

    fn source(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn test_parse_full_row() {
        let text = source(&[
            "Київська область;;;;м. Київ;01001;вул. Хрещатик;1, 3, 5;Київ СЦ;;;;;",
        ]);
        let parsed = parse_gazetteer_text(&text).unwrap();
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(parsed.records.len(), 1);

        let record = &parsed.records[0];
        assert_eq!(record.city, "м. Київ");
        assert_eq!(record.postal_index, "01001");
        assert_eq!(record.street, "вул. Хрещатик");
        assert_eq!(record.buildings, "1, 3, 5");
        assert_eq!(record.sort_center_1, "Київ СЦ");
        assert_eq!(record.normalized_city, "киів");
        assert!(record.is_working());
    }

    #[test]
    fn test_short_row_is_skipped() {
        let text = source(&["Київська область;;;", "Львівська область;;;;м. Львів;79000;;;;;;;;"]);
        let parsed = parse_gazetteer_text(&text).unwrap();
        assert_eq!(parsed.skipped_rows, 1);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].city, "м. Львів");
    }

    #[test]
    fn test_missing_optional_columns_read_as_empty() {
        let text = "Населений пункт;Назва вулиці\nм. Київ;вул. Хрещатик";
        let parsed = parse_gazetteer_text(text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].region, "");
        assert_eq!(parsed.records[0].street, "вул. Хрещатик");
    }

    #[test]
    fn test_missing_city_column_is_an_error() {
        let result = parse_gazetteer_text("Область;Назва вулиці\nКиївська;Хрещатик");
        assert!(matches!(result, Err(GazetteerError::MissingColumn(_))));
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice("Київ".as_bytes());
        let (text, encoding) = decode_source(&bytes).unwrap();
        assert_eq!(text, "Київ");
        assert_eq!(encoding, SourceEncoding::Utf8);
    }

    #[test]
    fn test_decode_windows_1251() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode("Київ;Хрещатик");
        let (text, encoding) = decode_source(&bytes).unwrap();
        assert_eq!(text, "Київ;Хрещатик");
        assert_eq!(encoding, SourceEncoding::Windows1251);
    }

    #[test]
    fn test_default_cache_path() {
        let path = GazetteerLoader::default_cache_path(Path::new("/data/magistral.csv"));
        assert_eq!(path, PathBuf::from("/data/magistral.csv.snapshot"));
    }

    fn write_source(path: &Path, rows: &[&str]) {
        std::fs::write(path, source(rows)).unwrap();
    }

    #[test]
    fn test_failed_forced_reload_keeps_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("magistral.csv");
        write_source(&path, &["Київська область;;;;м. Київ;01001;вул. Хрещатик;1;;;;;;"]);

        let loader = GazetteerLoader::new(&path);
        loader.load(true).unwrap();
        assert!(loader.cache().exists());

        // Settlement column gone: the source no longer parses
        std::fs::write(&path, "Область;Назва вулиці\nКиївська область;вул. Хрещатик\n").unwrap();
        assert!(loader.load(true).is_err());
        assert!(loader.cache().exists());

        let outcome = loader.load(false).unwrap();
        assert_eq!(outcome.origin, LoadOrigin::Snapshot);
        assert_eq!(outcome.index.len(), 1);
    }

    #[test]
    fn test_forced_reload_replaces_snapshot() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("magistral.csv");
        write_source(&path, &["Київська область;;;;м. Київ;01001;вул. Хрещатик;1;;;;;;"]);

        let loader = GazetteerLoader::new(&path);
        loader.load(true).unwrap();

        write_source(
            &path,
            &[
                "Київська область;;;;м. Київ;01001;вул. Хрещатик;1;;;;;;",
                "Львівська область;;;;м. Львів;79000;пл. Ринок;1;;;;;;",
            ],
        );
        let reloaded = loader.load(true).unwrap();
        assert!(matches!(reloaded.origin, LoadOrigin::Source { .. }));
        assert_eq!(reloaded.index.len(), 2);
        assert_eq!(loader.load(false).unwrap().index.len(), 2);
    }

    #[test]
    fn test_load_origin_display() {
        let origin = LoadOrigin::Source {
            encoding: SourceEncoding::Windows1251,
            skipped_rows: 2,
        };
        assert_eq!(origin.to_string(), "source (windows-1251, 2 rows skipped)");
        assert_eq!(LoadOrigin::Snapshot.to_string(), "snapshot");
    }
}
