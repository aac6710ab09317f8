use std::collections::BTreeMap;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pdbtbx::{Format, ReadOptions, StrictnessLevel};
use serde::Deserialize;

use super::model::{
    normalize_nucleotides, Contact, ContactSet, Pair, Position, Profile, ProfileRow, Sequence,
    SpatialModel, StructureCoordinateSet,
};
use super::structure::StructureModel;

/// Atom representing a residue in 3-D models unless configured otherwise.
pub const DEFAULT_ATOM: &str = "O2'";

/// One parsed input file, still in the numbering of the file itself.
#[derive(Debug, Clone)]
pub enum LoadedData {
    Sequence(Sequence),
    Profile(Profile),
    Contacts(ContactSet),
    /// Pairs plus the sequence they were written against.
    Structure { sequence: Sequence, pairs: Vec<Pair> },
    Coordinates(StructureCoordinateSet),
    Spatial(SpatialModel),
}

impl LoadedData {
    pub fn kind(&self) -> &'static str {
        match self {
            LoadedData::Sequence(_) => "sequence",
            LoadedData::Profile(_) => "profile",
            LoadedData::Contacts(_) => "contacts",
            LoadedData::Structure { .. } => "structure",
            LoadedData::Coordinates(_) => "coordinates",
            LoadedData::Spatial(_) => "3-D model",
        }
    }

    /// Sequence spelled out by the data, if it carries one. Used to seed a
    /// session when nothing defines the canonical sequence yet.
    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            LoadedData::Sequence(seq) => Some(seq.clone()),
            LoadedData::Structure { sequence, .. } => Some(sequence.clone()),
            LoadedData::Profile(profile) => Some(Sequence::new(profile.sample.clone(), &profile.fragment())),
            LoadedData::Coordinates(_) | LoadedData::Contacts(_) | LoadedData::Spatial(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by file name, then extension.
///
/// Supported formats:
/// * `.fa` / `.fasta`          – first FASTA record
/// * `*_profile.txt`           – ShapeMapper reactivity profile
/// * `.map`                    – 4-column SHAPE map (position, value, stderr, nt)
/// * `*rings.txt`              – RingMapper correlations
/// * `*pairmap.txt`            – PairMapper pair correlations
/// * `.ct`                     – connectivity table
/// * `.db` / `.dbn`            – dot-bracket
/// * `.coords` / `.tsv`/`.json`– secondary-structure diagram coordinates
/// * `.pdb` / `.cif`           – 3-D model, atom `O2'` of every residue
pub fn load_file(path: &Path) -> Result<LoadedData> {
    load_file_with(path, DEFAULT_ATOM, None)
}

/// [`load_file`] with an explicit atom name and chain for 3-D models.
pub fn load_file_with(path: &Path, atom: &str, chain: Option<&str>) -> Result<LoadedData> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let name = dataset_name(path);

    let text = || {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    };

    let data = if file_name.ends_with("_profile.txt") {
        LoadedData::Profile(parse_profile(&name, &text()?)?)
    } else if file_name.ends_with("rings.txt") || file_name.ends_with("pairmap.txt") {
        LoadedData::Contacts(parse_correlations(&name, &text()?)?)
    } else {
        match ext.as_str() {
            "fa" | "fasta" => LoadedData::Sequence(parse_fasta(&name, &text()?)?),
            "map" => LoadedData::Profile(parse_map(&name, &text()?)?),
            "ct" => {
                let (sequence, pairs) = parse_ct(&name, &text()?)?;
                LoadedData::Structure { sequence, pairs }
            }
            "db" | "dbn" => {
                let (sequence, pairs) = parse_dot_bracket(&name, &text()?)?;
                LoadedData::Structure { sequence, pairs }
            }
            "coords" | "tsv" => LoadedData::Coordinates(parse_coordinate_table(&text()?)?),
            "json" => LoadedData::Coordinates(parse_coordinate_json(&text()?)?),
            "pdb" => LoadedData::Spatial(parse_spatial(&text()?, Format::Pdb, atom, chain)?),
            "cif" | "mmcif" => LoadedData::Spatial(parse_spatial(&text()?, Format::Mmcif, atom, chain)?),
            other => bail!("Unsupported file extension: .{other}"),
        }
    };
    log::info!("Loaded {} from {}", data.kind(), path.display());
    Ok(data)
}

/// File stem without the tool suffixes, used as the dataset name.
pub fn dataset_name(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("dataset");
    ["_profile", "_rings", "-rings", "_pairmap", "-pairmap"]
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .unwrap_or(stem)
        .to_string()
}

// ---------------------------------------------------------------------------
// Sequences and structures
// ---------------------------------------------------------------------------

fn parse_fasta(name: &str, text: &str) -> Result<Sequence> {
    let mut header: Option<String> = None;
    let mut residues = String::new();
    for line in text.lines().map(str::trim) {
        if let Some(h) = line.strip_prefix('>') {
            if header.is_some() {
                break;
            }
            header = Some(h.trim().to_string());
        } else if !line.is_empty() && !line.starts_with(';') {
            residues.push_str(line);
        }
    }
    if residues.is_empty() {
        bail!("FASTA file contains no sequence");
    }
    Ok(Sequence::new(header.filter(|h| !h.is_empty()).unwrap_or_else(|| name.to_string()), &residues))
}

/// Connectivity table; only the first structure of a multi-structure file is read.
///
/// ```text
///    9  title
///    1 G  0  2  9  1
///    2 G  1  3  8  2
/// ```
fn parse_ct(name: &str, text: &str) -> Result<(Sequence, Vec<Pair>)> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().context("CT file is empty")?;
    let length: usize = header
        .split_whitespace()
        .next()
        .and_then(|n| n.parse().ok())
        .with_context(|| format!("CT header '{header}' does not start with a length"))?;

    let mut residues = String::with_capacity(length);
    let mut pairs = Vec::new();
    for (row, line) in lines.take(length).enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 {
            bail!("CT row {}: expected at least 5 columns, found {}", row + 1, fields.len());
        }
        let index: Position = fields[0]
            .parse()
            .with_context(|| format!("CT row {}: bad index '{}'", row + 1, fields[0]))?;
        let partner: Position = fields[4]
            .parse()
            .with_context(|| format!("CT row {}: bad partner '{}'", row + 1, fields[4]))?;
        residues.push_str(fields[1]);
        if partner > index {
            pairs.push(Pair::new(index, partner));
        }
    }
    if residues.len() != length {
        bail!("CT header announces {length} nucleotides but {} rows were read", residues.len());
    }
    let title = header.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
    let title = if title.is_empty() { name.to_string() } else { title };
    Ok((Sequence::new(title, &residues), pairs))
}

/// `>name`, sequence line, structure line (a trailing energy is ignored).
fn parse_dot_bracket(name: &str, text: &str) -> Result<(Sequence, Vec<Pair>)> {
    let mut title = name.to_string();
    let mut body = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(h) = line.strip_prefix('>') {
            title = h.trim().to_string();
        } else {
            body.push(line);
        }
    }
    let [residues, structure, ..] = body.as_slice() else {
        bail!("dot-bracket file needs a sequence line and a structure line");
    };
    let structure = structure.split_whitespace().next().unwrap_or("");
    let sequence = Sequence::new(title, residues);
    if structure.chars().count() != sequence.len() {
        bail!(
            "dot-bracket structure has {} symbols for a {} nt sequence",
            structure.chars().count(),
            sequence.len()
        );
    }
    let model = StructureModel::from_dot_bracket(structure).context("parsing dot-bracket")?;
    Ok((sequence, model.pairs().to_vec()))
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Empty cells and `nan` are missing values.
fn parse_optional_f64(value: Option<&str>) -> Result<Option<f64>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("nan") => Ok(None),
        Some(v) => {
            let parsed: f64 = v.parse().with_context(|| format!("'{v}' is not a number"))?;
            Ok(parsed.is_finite().then_some(parsed))
        }
    }
}

fn parse_optional_depth(value: Option<&str>) -> Result<Option<u64>> {
    Ok(parse_optional_f64(value)?.map(|v| v.max(0.0).round() as u64))
}

/// ShapeMapper `_profile.txt`: tab-separated with a header row.
fn parse_profile(name: &str, text: &str) -> Result<Profile> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().context("reading profile header")?.clone();
    let column = |names: &[&str]| names.iter().find_map(|n| headers.iter().position(|h| h.trim() == *n));

    let position_idx = column(&["Nucleotide"]).context("profile missing 'Nucleotide' column")?;
    let sequence_idx = column(&["Sequence"]).context("profile missing 'Sequence' column")?;
    let reactivity_idx = column(&["Norm_profile", "Reactivity_profile"]);
    let stderr_idx = column(&["Norm_stderr", "Std_err"]);
    let modified_idx = column(&["Modified_rate"]);
    let background_idx = column(&["Untreated_rate"]);
    let depth_idx = column(&["Modified_read_depth"]);
    let effective_idx = column(&["Modified_effective_depth"]);

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("profile row {row_no}"))?;
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i));
        let position: Position = get(Some(position_idx))
            .unwrap_or("")
            .trim()
            .parse()
            .with_context(|| format!("profile row {row_no}: bad nucleotide number"))?;
        let nucleotide = get(Some(sequence_idx))
            .and_then(|s| normalize_nucleotides(s).chars().next())
            .with_context(|| format!("profile row {row_no}: missing nucleotide"))?;

        let mut row = ProfileRow::new(position, nucleotide);
        let context = || format!("profile row {row_no}");
        row.reactivity = parse_optional_f64(get(reactivity_idx)).with_context(context)?;
        row.stderr = parse_optional_f64(get(stderr_idx)).with_context(context)?;
        row.modified_rate = parse_optional_f64(get(modified_idx)).with_context(context)?;
        row.background_rate = parse_optional_f64(get(background_idx)).with_context(context)?;
        row.read_depth = parse_optional_depth(get(depth_idx)).with_context(context)?;
        row.effective_depth = parse_optional_depth(get(effective_idx)).with_context(context)?;
        rows.push(row);
    }
    if reactivity_idx.is_none() {
        log::warn!("{name}: profile has no reactivity column");
    }
    Ok(Profile::new(name, rows))
}

/// `.map`: position, reactivity, stderr, nucleotide. `-999` marks no data.
fn parse_map(name: &str, text: &str) -> Result<Profile> {
    let mut rows = Vec::new();
    for (row_no, line) in text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [position, reactivity, stderr, nucleotide, ..] = fields.as_slice() else {
            bail!("map row {row_no}: expected 4 columns, found {}", fields.len());
        };
        let position: Position = position
            .parse()
            .with_context(|| format!("map row {row_no}: bad position '{position}'"))?;
        let nucleotide = normalize_nucleotides(nucleotide).chars().next().unwrap_or('N');
        let mut row = ProfileRow::new(position, nucleotide);
        let no_data = |v: Option<f64>| v.filter(|&x| x > -998.0);
        row.reactivity = no_data(parse_optional_f64(Some(*reactivity))?);
        row.stderr = no_data(parse_optional_f64(Some(*stderr))?);
        rows.push(row);
    }
    Ok(Profile::new(name, rows))
}

// ---------------------------------------------------------------------------
// Correlations
// ---------------------------------------------------------------------------

/// RingMapper / PairMapper output. The first line is a run header
/// (`<length> Window=1 Metric=APC ...`), the second holds column names.
fn parse_correlations(name: &str, text: &str) -> Result<ContactSet> {
    let (run_header, table) = text.split_once('\n').context("correlation file is empty")?;
    log::debug!("{name}: {}", run_header.trim());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(table.as_bytes());
    let headers = reader.headers().context("reading correlation header")?.clone();
    let column = |names: &[&str]| names.iter().find_map(|n| headers.iter().position(|h| h.trim() == *n));

    let i_idx = column(&["i"]).context("correlation file missing 'i' column")?;
    let j_idx = column(&["j"]).context("correlation file missing 'j' column")?;
    let stat_idx = column(&["Statistic", "Sig"]).context("correlation file missing 'Statistic' column")?;
    let sign_idx = column(&["+/-"]);
    let class_idx = column(&["Class"]);

    let mut contacts = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("correlation row {row_no}"))?;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let i: Position = field(i_idx)
            .parse()
            .with_context(|| format!("correlation row {row_no}: bad i '{}'", field(i_idx)))?;
        let j: Position = field(j_idx)
            .parse()
            .with_context(|| format!("correlation row {row_no}: bad j '{}'", field(j_idx)))?;
        let statistic: f64 = field(stat_idx)
            .parse()
            .with_context(|| format!("correlation row {row_no}: bad statistic '{}'", field(stat_idx)))?;
        let mut contact = Contact::new(i, j, statistic);
        if let Some(idx) = sign_idx {
            contact.sign = if field(idx).starts_with('-') { -1 } else { 1 };
        }
        if let Some(idx) = class_idx {
            contact.tag = field(idx).parse().ok();
        }
        contacts.push(contact);
    }
    Ok(ContactSet {
        name: name.to_string(),
        contacts,
    })
}

// ---------------------------------------------------------------------------
// Diagram coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CoordinateRecord {
    #[serde(alias = "Nucleotide")]
    nucleotide: String,
    #[serde(alias = "X")]
    x: f64,
    #[serde(alias = "Y")]
    y: f64,
}

fn coordinates_from_records(records: Vec<CoordinateRecord>) -> Result<StructureCoordinateSet> {
    let mut coords = StructureCoordinateSet::default();
    for (idx, record) in records.into_iter().enumerate() {
        let nt = normalize_nucleotides(&record.nucleotide)
            .chars()
            .next()
            .with_context(|| format!("coordinate {}: empty nucleotide", idx + 1))?;
        coords.insert(idx + 1, nt, [record.x, record.y]);
    }
    if coords.is_empty() {
        bail!("coordinate file has no rows");
    }
    Ok(coords)
}

/// Tab-separated `Nucleotide x y`, one row per position in sequence order.
fn parse_coordinate_table(text: &str) -> Result<StructureCoordinateSet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<CoordinateRecord>, _>>()
        .context("parsing coordinate table")?;
    coordinates_from_records(records)
}

/// `[{"nucleotide": "G", "x": 0.0, "y": 1.5}, ...]`
fn parse_coordinate_json(text: &str) -> Result<StructureCoordinateSet> {
    let records: Vec<CoordinateRecord> = serde_json::from_str(text).context("parsing coordinate JSON")?;
    coordinates_from_records(records)
}

// ---------------------------------------------------------------------------
// 3-D models
// ---------------------------------------------------------------------------

fn parse_spatial(input: &str, format: Format, atom: &str, chain: Option<&str>) -> Result<SpatialModel> {
    let reader = BufReader::new(input.as_bytes());
    let (pdb, errors) = ReadOptions::new()
        .set_format(format)
        .set_level(StrictnessLevel::Loose)
        .read_raw(reader)
        .map_err(|errs| {
            anyhow::anyhow!(
                errs.iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )
        })
        .context("parsing 3-D model")?;
    if !errors.is_empty() {
        log::debug!("3-D model parsed with {} warnings", errors.len());
    }

    let wanted = atom.replace('*', "'");
    let chain_id = match chain {
        Some(id) => id.to_string(),
        None => pdb
            .chains()
            .next()
            .map(|c| c.id().to_string())
            .context("3-D model has no chains")?,
    };

    let mut nucleotides = BTreeMap::new();
    let mut conformers = Vec::new();
    for model in pdb.models() {
        let mut positions = BTreeMap::new();
        for residue_chain in model.chains().filter(|c| c.id() == chain_id) {
            for residue in residue_chain.residues() {
                let Ok(position) = Position::try_from(residue.serial_number()) else {
                    continue;
                };
                let Some(conformer) = residue.conformers().next() else {
                    continue;
                };
                let Some(found) = conformer.atoms().find(|a| a.name().replace('*', "'") == wanted) else {
                    continue;
                };
                let nt = normalize_nucleotides(conformer.name()).chars().last().unwrap_or('N');
                nucleotides.entry(position).or_insert(nt);
                positions.insert(position, [found.x(), found.y(), found.z()]);
            }
        }
        conformers.push(positions);
    }
    if nucleotides.is_empty() {
        bail!("no '{atom}' atoms found in chain {chain_id}");
    }
    log::info!(
        "3-D model: chain {chain_id}, {} residues, {} conformers",
        nucleotides.len(),
        conformers.len()
    );
    Ok(SpatialModel {
        atom: wanted,
        nucleotides,
        conformers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DistanceMode;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, file_name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(file_name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_fasta_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "rna.fa", ">hairpin\nggga\naaccc\n>other\nAAAA\n");
        let LoadedData::Sequence(seq) = load_file(&path).unwrap() else {
            panic!("expected a sequence");
        };
        assert_eq!(seq.name(), "hairpin");
        assert_eq!(seq.as_str(), "GGGAAACCC");
    }

    #[test]
    fn test_load_profile_with_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let text = "Nucleotide\tSequence\tModified_rate\tModified_read_depth\tModified_effective_depth\tUntreated_rate\tNorm_profile\tNorm_stderr\n\
                    1\tG\t0.01\t1500\t1400\t0.001\tnan\tnan\n\
                    2\tT\t0.05\t1600\t1550\t0.002\t1.2\t0.1\n";
        let path = write_temp(&dir, "sample_profile.txt", text);
        let LoadedData::Profile(profile) = load_file(&path).unwrap() else {
            panic!("expected a profile");
        };
        assert_eq!(profile.sample, "sample");
        assert_eq!(profile.fragment(), "GU");
        assert_eq!(profile.rows[0].reactivity, None);
        assert_eq!(profile.rows[0].read_depth, Some(1500));
        assert_eq!(profile.rows[1].reactivity, Some(1.2));
        assert_eq!(profile.rows[1].effective_depth, Some(1550));
    }

    #[test]
    fn test_load_map_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "s.map", "1\t-999\t0\tG\n2\t0.5\t0.05\tA\n");
        let LoadedData::Profile(profile) = load_file(&path).unwrap() else {
            panic!("expected a profile");
        };
        assert_eq!(profile.rows[0].reactivity, None);
        assert_eq!(profile.rows[1].reactivity, Some(0.5));
    }

    #[test]
    fn test_load_rings_and_pairmap() {
        let dir = tempfile::tempdir().unwrap();
        let rings = "120\tWindow=1\tMetric=APC\n\
                     i\tj\tStatistic\t+/-\tZij\n\
                     10\t40\t35.2\t1\t4.1\n\
                     12\t50\t22.0\t-1\t3.0\n";
        let path = write_temp(&dir, "sample_rings.txt", rings);
        let LoadedData::Contacts(set) = load_file(&path).unwrap() else {
            panic!("expected contacts");
        };
        assert_eq!(set.name, "sample");
        assert_eq!(set.contacts.len(), 2);
        assert_eq!(set.contacts[1].sign, -1);
        assert_eq!(set.contacts[0].statistic, 35.2);

        let pairmap = "120\tWindow=3\tType=pairmap\n\
                       i\tj\tSig\tClass\tZij\n\
                       5\t30\t40.0\t1\t3.3\n";
        let path = write_temp(&dir, "sample-pairmap.txt", pairmap);
        let LoadedData::Contacts(set) = load_file(&path).unwrap() else {
            panic!("expected contacts");
        };
        assert_eq!(set.contacts[0].tag, Some(1));
        assert_eq!(set.contacts[0].sign, 1);
    }

    #[test]
    fn test_load_ct() {
        let dir = tempfile::tempdir().unwrap();
        let ct = "   6  hp\n\
                  1 G 0 2 6 1\n\
                  2 G 1 3 5 2\n\
                  3 A 2 4 0 3\n\
                  4 A 3 5 0 4\n\
                  5 C 4 6 2 5\n\
                  6 C 5 0 1 6\n";
        let path = write_temp(&dir, "hp.ct", ct);
        let LoadedData::Structure { sequence, pairs } = load_file(&path).unwrap() else {
            panic!("expected a structure");
        };
        assert_eq!(sequence.as_str(), "GGAACC");
        assert_eq!(pairs, vec![Pair::new(1, 6), Pair::new(2, 5)]);
    }

    #[test]
    fn test_load_ct_truncated_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "bad.ct", "4 bad\n1 G 0 2 4 1\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_load_dot_bracket() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "hp.dbn", ">hp\nGGGAAACCC\n(((...))) (-3.40)\n");
        let LoadedData::Structure { sequence, pairs } = load_file(&path).unwrap() else {
            panic!("expected a structure");
        };
        assert_eq!(sequence.name(), "hp");
        assert_eq!(pairs.len(), 3);

        let path = write_temp(&dir, "short.db", "GGGAAACCC\n(((...)\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_load_coordinates_table_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "hp.coords", "Nucleotide\tx\ty\nG\t0.0\t0.0\nA\t1.0\t0.5\n");
        let LoadedData::Coordinates(coords) = load_file(&path).unwrap() else {
            panic!("expected coordinates");
        };
        assert_eq!(coords.fragment(), "GA");
        assert_eq!(coords.get(2), Some([1.0, 0.5]));

        let json = r#"[{"nucleotide": "g", "x": 1.0, "y": 2.0}, {"nucleotide": "U", "x": 3.0, "y": 4.0}]"#;
        let path = write_temp(&dir, "hp.json", json);
        let LoadedData::Coordinates(coords) = load_file(&path).unwrap() else {
            panic!("expected coordinates");
        };
        assert_eq!(coords.fragment(), "GU");
    }

    /// One fixed-column ATOM record.
    fn atom_line(serial: usize, name: &str, residue: &str, chain: char, seq: usize, xyz: [f64; 3]) -> String {
        let element = &name.trim_start()[..1];
        format!(
            "ATOM  {serial:>5} {name:<4} {residue:>3} {chain}{seq:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {element:>2}",
            xyz[0], xyz[1], xyz[2], 1.0, 0.0
        )
    }

    /// Two models of a two-chain RNA. Chain A residue 2 moves from 5 Å to
    /// 10 Å away from residue 1; chain B names the ribose atom `O2*`.
    fn two_model_pdb() -> String {
        let mut lines = Vec::new();
        for (model, far) in [(1, [3.0, 4.0, 0.0]), (2, [6.0, 8.0, 0.0])] {
            let mut serial = 1;
            lines.push(format!("MODEL     {model:>4}"));
            for (seq, residue, xyz) in [(1, "G", [0.0, 0.0, 0.0]), (2, "C", far)] {
                lines.push(atom_line(serial, " P", residue, 'A', seq, [xyz[0], xyz[1], 9.0]));
                lines.push(atom_line(serial + 1, " O2'", residue, 'A', seq, xyz));
                serial += 2;
            }
            for (seq, residue, z) in [(1, "A", 0.0), (2, "U", 2.0)] {
                lines.push(atom_line(serial, " O2*", residue, 'B', seq, [20.0, 20.0, z]));
                serial += 1;
            }
            lines.push("ENDMDL".to_string());
        }
        lines.push("END".to_string());
        lines.join("\n") + "\n"
    }

    #[test]
    fn test_load_pdb_models_and_chains() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "model.pdb", &two_model_pdb());

        let LoadedData::Spatial(model) = load_file(&path).unwrap() else {
            panic!("expected a 3-D model");
        };
        assert_eq!(model.atom, "O2'");
        assert_eq!(model.fragment(), "GC");
        assert_eq!(model.conformers.len(), 2);
        assert_eq!(model.distance(1, 2, DistanceMode::Min), Some(5.0));
        assert_eq!(model.distance(1, 2, DistanceMode::Mean), Some(7.5));

        let LoadedData::Spatial(chain_b) = load_file_with(&path, "O2'", Some("B")).unwrap() else {
            panic!("expected a 3-D model");
        };
        assert_eq!(chain_b.fragment(), "AU");
        assert_eq!(chain_b.distance(1, 2, DistanceMode::Min), Some(2.0));

        let LoadedData::Spatial(phosphates) = load_file_with(&path, "P", None).unwrap() else {
            panic!("expected a 3-D model");
        };
        assert_eq!(phosphates.distance(1, 2, DistanceMode::Min), Some(5.0));
    }

    #[test]
    fn test_load_pdb_without_requested_atom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "model.pdb", &two_model_pdb());
        let err = load_file_with(&path, "N1", None).unwrap_err();
        assert!(format!("{err:#}").contains("no 'N1' atoms"));
        assert!(load_file_with(&path, "O2'", Some("Z")).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "data.xyz", "");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }

    #[test]
    fn test_dataset_name_strips_tool_suffix() {
        assert_eq!(dataset_name(Path::new("/tmp/rnaseP_profile.txt")), "rnaseP");
        assert_eq!(dataset_name(Path::new("rnaseP-pairmap.txt")), "rnaseP");
        assert_eq!(dataset_name(Path::new("model.pdb")), "model");
    }
}
