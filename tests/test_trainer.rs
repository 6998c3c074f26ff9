use hmmtag::{BaselineTagger, Dataset, Error, HmmConfig, HmmModel, HmmTagger, Tagger, UnknownPolicy};

const TRAIN: &str = "\
The/DET dog/NOUN barked/VERB loudly/ADV ./PUNCT
A/DET cat/NOUN sleeps/VERB ./PUNCT
The/DET cat/NOUN chased/VERB the/DET dog/NOUN ./PUNCT
Dogs/NOUN run/VERB quickly/ADV ./PUNCT
the/DET NASA/PROPN rocket/NOUN flies/VERB ./PUNCT
A/DET bird/NOUN sings/VERB ./PUNCT";

const TEST: &str = "\
The/DET cat/NOUN barked/VERB ./PUNCT
A/DET dog/NOUN sleeps/VERB loudly/ADV ./PUNCT";

fn corpus(s: &str) -> Dataset {
    s.parse().expect("failed to read corpus")
}

#[test]
fn rows_sum_to_one() {
    for (k, k_e) in [(0.01, 0.01), (1.0, 0.5), (0.0, 2.0)] {
        let config = HmmConfig {
            k_transition: k,
            k_emission: k_e,
            ..Default::default()
        };
        let mut tagger = HmmTagger::new(config);
        tagger.train(&corpus(TRAIN));
        let table = tagger.model().unwrap().table();
        let mass = table.row_mass();
        assert_eq!(mass.len(), 2 * table.num_tags() + 1);
        for (i, m) in mass.iter().enumerate() {
            // with k = 0 the PUNCT transition row has no mass at all
            if k == 0.0 && *m == 0.0 {
                continue;
            }
            assert!((m - 1.0).abs() < 1e-9, "row {i}: {m}");
        }
    }
}

#[test]
fn tags_training_sentences() {
    let mut tagger = HmmTagger::new(HmmConfig::default());
    tagger.train(&corpus(TRAIN));
    let evaluation = tagger.evaluate(&corpus(TEST)).unwrap();
    assert_eq!(evaluation.accuracy(), 1.0);
    assert!(evaluation.mismatches().is_empty());
    assert_eq!(evaluation.num_tokens(), 9);
}

#[test]
fn fallback_tag_from_singletons() {
    let mut tagger = HmmTagger::new(HmmConfig::default());
    tagger.train(&corpus(TRAIN));
    // every VERB token occurs once; NOUN has three singletons, ADV two
    assert_eq!(tagger.model().unwrap().fallback(), Some("VERB"));
}

#[test]
fn shape_heuristic_routes_unknown_tokens() {
    let config = HmmConfig {
        extension: true,
        ..Default::default()
    };
    let mut tagger = HmmTagger::new(config);
    tagger.train(&corpus(TRAIN));
    let table = tagger.model().unwrap().table();
    let policy = tagger.policy().unwrap();
    let id = |tag: &str| table.tag_id(tag);
    assert_eq!(policy.pseudo_tag("happily"), id("ADV"));
    assert_eq!(policy.pseudo_tag("running"), id("VERB"));
    assert_eq!(policy.pseudo_tag("jumped"), id("VERB"));
    assert_eq!(policy.pseudo_tag("Capital"), id("NOUN"));
    assert_eq!(policy.pseudo_tag("ACRONYM"), id("PROPN"));
    assert_eq!(policy.pseudo_tag("zyx"), id("VERB"));

    // the unknown score comes from the pseudo-tag whatever tag is scored
    let adv = id("ADV").unwrap();
    for tag in 0..table.num_tags() {
        assert_eq!(policy.resolve_emission(table, tag, "happily"), table.unknown(adv));
    }
}

#[test]
fn unseen_adverb_in_context() {
    // the surrounding tags already pick ADV, with or without the shape heuristic
    let test = corpus("The/DET dog/NOUN sleeps/VERB happily/ADV ./PUNCT");
    for extension in [false, true] {
        let config = HmmConfig {
            extension,
            ..Default::default()
        };
        let mut tagger = HmmTagger::new(config);
        tagger.train(&corpus(TRAIN));
        assert_eq!(
            tagger.tag(&["The", "dog", "sleeps", "happily", "."]).unwrap(),
            ["DET", "NOUN", "VERB", "ADV", "PUNCT"]
        );
        assert_eq!(tagger.evaluate(&test).unwrap().accuracy(), 1.0);
    }
}

#[test]
fn reserved_policy_without_extension() {
    let mut tagger = HmmTagger::new(HmmConfig::default());
    tagger.train(&corpus(TRAIN));
    assert_eq!(tagger.policy().unwrap(), &UnknownPolicy::Reserved);
    let tags = tagger.tag(&["The", "zyx", "sleeps", "."]).unwrap();
    assert_eq!(tags.len(), 4);
    assert_eq!(tags[0], "DET");
    assert_eq!(tags[3], "PUNCT");
}

#[test]
fn baseline_shares_the_contract() {
    let taggers: Vec<Box<dyn Tagger>> = vec![
        Box::new(BaselineTagger::new()),
        Box::new(HmmTagger::new(HmmConfig::default())),
    ];
    for mut tagger in taggers {
        assert!(!tagger.is_trained());
        assert!(tagger.evaluate(&corpus(TEST)).is_err());
        tagger.train(&corpus(TRAIN));
        let evaluation = tagger.evaluate(&corpus(TEST)).unwrap();
        assert!((0.0..=1.0).contains(&evaluation.accuracy()));
        assert_eq!(evaluation.num_sentences(), 2);
    }
}

#[test]
fn empty_corpus_leaves_taggers_untrained() {
    let taggers: Vec<Box<dyn Tagger>> = vec![
        Box::new(BaselineTagger::new()),
        Box::new(HmmTagger::new(HmmConfig::default())),
    ];
    for mut tagger in taggers {
        tagger.train(&Dataset::default());
        assert!(!tagger.is_trained());
        assert!(matches!(tagger.tag(&["dog"]), Err(Error::NotTrained)));
    }
}

#[test]
fn mismatches_are_collected() {
    let mut tagger = BaselineTagger::new();
    tagger.train(&corpus(TRAIN));
    // "The" is DET in training, gold says otherwise
    let test = corpus("The/NOUN cat/NOUN ./PUNCT\nA/DET cat/NOUN ./PUNCT");
    let evaluation = tagger.evaluate(&test).unwrap();
    assert!((evaluation.accuracy() - 5.0 / 6.0).abs() < 1e-12);
    let mismatches = evaluation.mismatches();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].tokens, ["The", "cat", "."]);
    assert_eq!(mismatches[0].gold, ["NOUN", "NOUN", "PUNCT"]);
    assert_eq!(mismatches[0].predicted, ["DET", "NOUN", "PUNCT"]);
}

#[test]
fn trained_model_survives_dump() {
    let config = HmmConfig {
        extension: true,
        ..Default::default()
    };
    let mut tagger = HmmTagger::new(config.clone());
    tagger.train(&corpus(TRAIN));
    let model = tagger.model().unwrap();

    let fpath = std::env::temp_dir().join(format!("hmmtag-{}.json", std::process::id()));
    model.dump(&fpath).expect("failed to write model");
    let loaded = HmmModel::from_path(&fpath).expect("failed to read model");
    std::fs::remove_file(&fpath).ok();

    assert_eq!(loaded.fallback(), Some("VERB"));
    let reloaded = HmmTagger::with_model(config, loaded);
    let tokens = ["A", "bird", "chased", "NASA", "quickly", "."];
    assert_eq!(reloaded.tag(&tokens).unwrap(), tagger.tag(&tokens).unwrap());
}
