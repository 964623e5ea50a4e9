use telop_fit::{
    AutofitResult, AutofitSolver, FitConfig, FontContext, HeuristicMeasureHost, MeasuredSentence,
    PunctuationConfig, StageGeometry, Tokenizer, WidthOracle,
};

/// Sentences in the shape the display page receives: plain, ruby-annotated,
/// quoted, and long enough to need compression.
pub const SENTENCES: &[&str] = &[
    "今日は、[東京]{とうきょう}で会議です。",
    "彼は「はい」と言った",
    "ラジオ　番組　への　質問を　募集しています。",
    "[質問]{しつもん}　ありがとう　ございます！",
    "本日の　ゲストは　[新宿]{しんじゅく}　から　お越しの　山田さん　です。",
    "この　あと　会場　からの　質問も　受け付けます。",
];

/// A sentence that overflows two lines at base scale on a 1200px stage.
pub fn long_sentence() -> String {
    let mut out = String::new();
    for _ in 0..6 {
        out.push_str("本日の　ゲストは　[新宿]{しんじゅく}　から　お越しの　山田さん　です。");
    }
    out
}

pub fn stage(width: f32) -> StageGeometry {
    let font = FontContext::default();
    StageGeometry::new(width, font.line_height_px, (-15.0f32).to_radians().tan())
}

pub fn oracle() -> WidthOracle<HeuristicMeasureHost> {
    WidthOracle::new(HeuristicMeasureHost::new(), PunctuationConfig::default())
}

/// Tokenize, measure and solve with the fallback tokenizer and heuristic widths.
pub fn fit(
    text: &str,
    config: FitConfig,
    geometry: &StageGeometry,
) -> (MeasuredSentence, AutofitResult) {
    AutofitSolver::new(config)
        .fit_text(
            &Tokenizer::fallback_only(),
            &oracle(),
            text,
            &FontContext::default(),
            geometry,
        )
        .unwrap_or_else(|e| panic!("fit {:?}: {}", text, e))
}
