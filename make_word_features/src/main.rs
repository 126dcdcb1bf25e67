use std::fs::File;
use std::io::{self, stdout, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wordfeats::{FeatureDictionary, FeatureExtractor, FeatureWriter, UnigramProbs, Vocabulary};

#[derive(Parser, Debug)]
#[command(
    name = "make_word_features",
    about = "A program to turn the words into the sparse feature representation.",
    after_help = "E.g. make_word_features --unigram-probs=exp/rnnlm/unigram_probs.txt \
                  data/rnnlm/vocab/words.txt exp/rnnlm/features.txt > exp/rnnlm/word_feats.txt"
)]
struct Args {
    /// The file containing unigram probs
    #[arg(long)]
    unigram_probs: PathBuf,

    /// Path for vocab file
    vocab_file: PathBuf,

    /// Path for features file
    features_file: PathBuf,

    /// The file to write the word features to (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of threads (0 means the number of CPUs)
    #[arg(long, default_value = "1")]
    n_threads: usize,
}

/// Opens an input file. Files with the `.zst` extension are decompressed.
fn open_input(path: &Path) -> io::Result<Box<dyn BufRead>> {
    let f = File::open(path)?;
    if path.extension().map_or(false, |ext| ext == "zst") {
        Ok(Box::new(BufReader::new(zstd::Decoder::new(f)?)))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading vocab file {:?} ...", args.vocab_file);
    let vocab = Vocabulary::from_reader(open_input(&args.vocab_file)?)?;
    info!("# of words: {}", vocab.len());

    info!("Loading unigram probs file {:?} ...", args.unigram_probs);
    let unigram_probs = UnigramProbs::from_reader(open_input(&args.unigram_probs)?)?;

    info!("Loading features file {:?} ...", args.features_file);
    let dict = FeatureDictionary::from_reader(open_input(&args.features_file)?)?;

    let extractor = FeatureExtractor::new(dict, unigram_probs, &vocab)?;
    let dict = extractor.dictionary();
    match (dict.min_ngram_order(), dict.max_ngram_order()) {
        (Some(min), Some(max)) => info!("n-gram orders: {}..={}", min, max),
        _ => info!("No n-gram feature"),
    }

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(stdout().lock()),
    };
    let mut wtr = FeatureWriter::new(BufWriter::new(out));

    if args.n_threads == 1 {
        info!("Start extraction");
        for (id, word) in vocab.iter() {
            wtr.write_entry(id, &extractor.extract(word, id))?;
        }
    } else {
        info!("Start extraction with {} threads", args.n_threads);
        let all_features = extractor.extract_all_parallel(&vocab, args.n_threads)?;
        for (id, features) in all_features.iter().enumerate() {
            wtr.write_entry(id, features)?;
        }
    }
    let n_words = wtr.n_words();
    wtr.into_inner()?;

    info!("made features for {} words.", n_words);

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("make_word_features: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("make_word_features-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_open_input_zst() {
        let data = "<eps> 0\n</s> 1\ncat 2\n";
        let path = temp_path("words.txt.zst");
        fs::write(&path, zstd::encode_all(data.as_bytes(), 3).unwrap()).unwrap();

        let vocab = Vocabulary::from_reader(open_input(&path).unwrap());
        fs::remove_file(&path).unwrap();

        let vocab = vocab.unwrap();
        assert_eq!(3, vocab.len());
        assert_eq!(Some(2), vocab.get_id("cat"));
        assert_eq!(Some("</s>"), vocab.get_word(1));
    }

    #[test]
    fn test_open_input_plain() {
        let data = "<eps> 0\ncat 1\n";
        let path = temp_path("words.txt");
        fs::write(&path, data).unwrap();

        let vocab = Vocabulary::from_reader(open_input(&path).unwrap());
        fs::remove_file(&path).unwrap();

        let vocab = vocab.unwrap();
        assert_eq!(2, vocab.len());
        assert_eq!(Some(1), vocab.get_id("cat"));
    }

    #[test]
    fn test_open_input_missing() {
        assert!(open_input(&temp_path("missing.txt.zst")).is_err());
    }
}
