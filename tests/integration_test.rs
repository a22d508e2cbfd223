use exam_ingest::config::Config;
use exam_ingest::models::{infer_identity, AnswerValue, QuestionBody, QuestionType};
use exam_ingest::{App, DocCtx, DocumentFlow, ExamDocument, FindingCategory, FlowOutcome};

const SOURCE_NAME: &str = "13. P2 - The Secret Life of Bees.html";

const PASSAGE: &str = r#"
  <section id="left">
    <h3>【中】The Secret Life of Bees</h3>
    <div class="paragraph-wrapper">
      <p><strong>A</strong> Bees have lived alongside humans for millennia.</p>
    </div>
    <div class="paragraph-wrapper">
      <p><strong>B</strong> Honey was traded widely.<br>It was valuable.</p>
    </div>
  </section>"#;

const QUESTIONS: &str = r#"
  <section id="right">
    <div class="group">
      <h4>Questions 14–15</h4>
      <p>Choose TWO letters, A–E.</p>
      <div class="mcq-item">
        <p><strong>14–15</strong> Which TWO facts about bees are mentioned?</p>
        <label><input type="checkbox" name="q14" value="A"> A They sleep</label>
        <label><input type="checkbox" name="q14" value="B"> B They dance</label>
        <label><input type="checkbox" name="q14" value="C"> C They hibernate</label>
        <label><input type="checkbox" name="q14" value="D"> D They trade</label>
        <label><input type="checkbox" name="q14" value="E"> E They sing</label>
      </div>
    </div>
    <div class="group">
      <h4>Questions 16–17</h4>
      <p>Do the following statements agree with the information given?</p>
      <p>Write TRUE, FALSE or NOT GIVEN.</p>
      <div class="question-item">
        <p><strong>16</strong> Bees arrived recently.</p>
        <label><input type="radio" name="q16" value="TRUE"> TRUE</label>
        <label><input type="radio" name="q16" value="FALSE"> FALSE</label>
        <label><input type="radio" name="q16" value="NOT GIVEN"> NOT GIVEN</label>
      </div>
      <div class="question-item">
        <p><strong>17</strong> Honey was valuable.</p>
        <label><input type="radio" name="q17" value="TRUE"> TRUE</label>
        <label><input type="radio" name="q17" value="FALSE"> FALSE</label>
        <label><input type="radio" name="q17" value="NOT GIVEN"> NOT GIVEN</label>
      </div>
    </div>
    <div class="group"__REUSE__>
      <h4>Questions 18–19</h4>
      <p>Which paragraph contains the following information?</p>
      <div class="options-pool">
        <div class="drag-item" data-option="A">A</div>
        <div class="drag-item" data-option="B">B</div>
      </div>
      <div class="match-question-item"><p><strong>18</strong> a long shared history</p><div class="drop-zone"></div></div>
      <div class="match-question-item"><p><strong>19</strong> the commercial value of honey</p><div class="drop-zone"></div></div>
    </div>
    <div class="group">
      <h4>Question 20</h4>
      <p>Complete the sentence below.</p>
      <p>Choose NO MORE THAN TWO WORDS from the passage for each answer.</p>
      <p><strong>20</strong> Bees can suffer from <input type="text" name="q20"></p>
    </div>
  </section>"#;

const ANSWERS: &str = r#"
  const correctAnswers = { q14: ['B', 'D'], q16: 'false', q17: 'TRUE', q18: 'A', q19: 'B', q20: __Q20__ };
  const questionExplanations = { q16: { analysis: 'Paragraph A says “millennia”.' } };"#;

struct Fixture {
    reuse: bool,
    q20: &'static str,
    drop_answer: Option<&'static str>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            reuse: true,
            q20: "'Disease'",
            drop_answer: None,
        }
    }
}

impl Fixture {
    fn html(&self) -> String {
        let questions = QUESTIONS.replace("__REUSE__", if self.reuse { " data-reuse" } else { "" });
        let mut answers = ANSWERS.replace("__Q20__", self.q20);
        if let Some(entry) = self.drop_answer {
            answers = answers.replace(entry, "");
        }
        format!(
            "<html><body>{}{}<script>{}</script></body></html>",
            PASSAGE, questions, answers
        )
    }

    fn run(&self) -> FlowOutcome {
        let identity = infer_identity(SOURCE_NAME).unwrap();
        let ctx = DocCtx::new(identity.document_id(), SOURCE_NAME.to_string(), 1);
        DocumentFlow::default().run(&self.html(), identity, &ctx)
    }

    fn document(&self) -> ExamDocument {
        let outcome = self.run();
        let fatal: Vec<String> = outcome
            .findings
            .iter()
            .filter(|f| f.is_fatal())
            .map(|f| f.to_string())
            .collect();
        assert!(fatal.is_empty(), "unexpected fatal findings: {:?}", fatal);
        outcome.output.unwrap().document
    }
}

#[test]
fn test_document_identity_and_passage() {
    let doc = Fixture::default().document();
    assert_eq!(doc.id, "e013");
    assert_eq!(doc.passage.title, "The Secret Life of Bees");
    assert_eq!(doc.passage.paragraphs.len(), 2);
    assert_eq!(doc.passage.paragraphs[0].label.as_deref(), Some("A"));
    assert_eq!(doc.passage.paragraphs[1].content, "Honey was traded widely.\nIt was valuable.");
}

#[test]
fn test_multi_choice_occupies_two_numbers() {
    let doc = Fixture::default().document();
    let first = &doc.questions[0];
    assert_eq!(first.number, 14);
    match &first.body {
        QuestionBody::MultiChoice {
            checkbox_group_name,
            occupies_questions,
            content,
        } => {
            assert_eq!(checkbox_group_name, "group14");
            assert_eq!(*occupies_questions, 2);
            assert_eq!(content.options.len(), 5);
        }
        other => panic!("expected multi choice, got {:?}", other),
    }
    assert_eq!(first.answer, AnswerValue::Multiple(vec!["B".into(), "D".into()]));

    // 多选题占用 14、15，下一题从 16 开始
    assert_eq!(doc.questions[1].number, 16);
}

#[test]
fn test_judgment_answers_are_normalised() {
    let doc = Fixture::default().document();
    let q16 = doc.questions.iter().find(|q| q.number == 16).unwrap();
    let q17 = doc.questions.iter().find(|q| q.number == 17).unwrap();

    assert_eq!(q16.question_type(), QuestionType::TrueFalseNg);
    assert_eq!(q16.answer, AnswerValue::Single("FALSE".into()));
    assert_eq!(q16.explanation.as_deref(), Some("Paragraph A says 'millennia'."));
    assert_eq!(q17.answer, AnswerValue::Single("TRUE".into()));
}

#[test]
fn test_matching_reuse_flag() {
    let reusable = Fixture::default().document();
    let q18 = reusable.questions.iter().find(|q| q.number == 18).unwrap();
    assert_eq!(q18.question_type(), QuestionType::ParagraphMatching);
    assert_eq!(q18.body.can_reuse(), Some(true));

    let single_use = Fixture {
        reuse: false,
        ..Default::default()
    }
    .document();
    let q18 = single_use.questions.iter().find(|q| q.number == 18).unwrap();
    assert_eq!(q18.body.can_reuse(), Some(false));
}

#[test]
fn test_completion_answer_case_and_shape() {
    let doc = Fixture::default().document();
    let q20 = doc.questions.last().unwrap();
    assert_eq!(q20.number, 20);
    assert_eq!(q20.question_type(), QuestionType::SentenceCompletion);
    assert_eq!(q20.answer, AnswerValue::Single("disease".into()));

    // 非多选题的列表答案保持列表形状
    let listed = Fixture {
        q20: "['Disease']",
        ..Default::default()
    }
    .document();
    assert_eq!(
        listed.questions.last().unwrap().answer,
        AnswerValue::Multiple(vec!["disease".into()])
    );
}

#[test]
fn test_metadata_summarises_questions() {
    let doc = Fixture::default().document();
    assert_eq!(doc.metadata.total_questions, doc.questions.len());
    assert_eq!(doc.metadata.total_questions, 6);
    assert_eq!(
        doc.metadata.question_types,
        vec![
            QuestionType::MultipleChoiceMultiple,
            QuestionType::TrueFalseNg,
            QuestionType::ParagraphMatching,
            QuestionType::SentenceCompletion,
        ]
    );
}

#[test]
fn test_missing_answer_rejects_document() {
    let outcome = Fixture {
        drop_answer: Some("q17: 'TRUE',"),
        ..Default::default()
    }
    .run();

    assert!(!outcome.accepted());
    let fatal: Vec<_> = outcome.findings.iter().filter(|f| f.is_fatal()).collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].category, FindingCategory::Binding);
    assert_eq!(fatal[0].question, Some(17));
}

#[test]
fn test_output_is_idempotent_and_round_trips() {
    let first = Fixture::default().run().output.unwrap().json;
    let second = Fixture::default().run().output.unwrap().json;
    assert_eq!(first, second);
    assert!(first.ends_with('\n'));

    let reparsed: ExamDocument = serde_json::from_str(&first).unwrap();
    assert_eq!(reparsed, Fixture::default().document());

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["questions"][0]["checkboxGroupName"], "group14");
    assert_eq!(value["questions"][0]["occupiesQuestions"], 2);
    assert_eq!(value["metadata"]["totalQuestions"], 6);
}

#[tokio::test]
async fn test_app_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join(SOURCE_NAME), Fixture::default().html()).unwrap();
    std::fs::write(
        input.join("14. P2 - Broken.html"),
        Fixture {
            drop_answer: Some("q17: 'TRUE',"),
            ..Default::default()
        }
        .html(),
    )
    .unwrap();

    let config = Config {
        input_root: input.display().to_string(),
        output_root: dir.path().join("output").display().to_string(),
        output_log_file: dir.path().join("ingest.log").display().to_string(),
        max_concurrent_docs: 2,
        ..Default::default()
    };
    let paths = config.paths();

    let report = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.outcomes[0].id, "e013");
    assert_eq!(report.outcomes[1].id, "e014");

    assert!(paths.json_dir.join("e013.json").exists());
    assert!(!paths.json_dir.join("e014.json").exists());
    assert!(!paths.json_dir.join("e013.json.tmp").exists());

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.report_path).unwrap()).unwrap();
    assert_eq!(written["accepted"], 1);
    assert_eq!(written["outcomes"][1]["accepted"], false);

    let log = std::fs::read_to_string(dir.path().join("ingest.log")).unwrap();
    assert!(log.contains("文档 e014"));
}

/// 用给定的题目区和脚本拼出一篇文档并直接跑流程
fn run_page(source_name: &str, questions: &str, script: &str) -> FlowOutcome {
    let html = format!(
        "<html><body>{}<section id=\"right\">{}</section><script>{}</script></body></html>",
        PASSAGE, questions, script
    );
    let identity = infer_identity(source_name).unwrap();
    let ctx = DocCtx::new(identity.document_id(), source_name.to_string(), 1);
    DocumentFlow::default().run(&html, identity, &ctx)
}

fn accepted_document(outcome: FlowOutcome) -> ExamDocument {
    let fatal: Vec<String> = outcome
        .findings
        .iter()
        .filter(|f| f.is_fatal())
        .map(|f| f.to_string())
        .collect();
    assert!(fatal.is_empty(), "unexpected fatal findings: {:?}", fatal);
    outcome.output.unwrap().document
}

const YNNG_QUESTIONS: &str = r#"
    <div class="group">
      <h4>Questions 14–15</h4>
      <p>Do the following statements agree with the claims of the writer?</p>
      <p>Write YES, NO or NOT GIVEN.</p>
      <div class="question-item">
        <p><strong>14</strong> Bees deserve more attention.</p>
        <label><input type="radio" name="q14" value="YES"> YES</label>
        <label><input type="radio" name="q14" value="NO"> NO</label>
        <label><input type="radio" name="q14" value="NOT GIVEN"> NOT GIVEN</label>
      </div>
      <div class="question-item">
        <p><strong>15</strong> Honey will become cheaper.</p>
        <label><input type="radio" name="q15" value="YES"> YES</label>
        <label><input type="radio" name="q15" value="NO"> NO</label>
        <label><input type="radio" name="q15" value="NOT GIVEN"> NOT GIVEN</label>
      </div>
    </div>"#;

#[test]
fn test_yes_no_not_given_document() {
    let doc = accepted_document(run_page(
        "15. P2 - Opinions on Bees.html",
        YNNG_QUESTIONS,
        "const correctAnswers = { q14: 'yes', q15: 'Not Given' };",
    ));

    assert_eq!(doc.id, "e015");
    assert_eq!(doc.metadata.question_types, vec![QuestionType::YesNoNg]);
    assert_eq!(doc.questions[0].answer, AnswerValue::Single("YES".into()));
    assert_eq!(doc.questions[1].answer, AnswerValue::Single("NOT GIVEN".into()));

    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["questions"][0]["type"], "yes-no-ng");
}

#[test]
fn test_scalar_answer_for_multi_choice_rejects_document() {
    let html = Fixture::default()
        .html()
        .replace("q14: ['B', 'D']", "q14: 'B'");
    let identity = infer_identity(SOURCE_NAME).unwrap();
    let ctx = DocCtx::new(identity.document_id(), SOURCE_NAME.to_string(), 1);
    let outcome = DocumentFlow::default().run(&html, identity, &ctx);

    assert!(!outcome.accepted());
    assert!(outcome.output.is_none());
    let fatal: Vec<_> = outcome.findings.iter().filter(|f| f.is_fatal()).collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].category, FindingCategory::Binding);
    assert_eq!(fatal[0].question, Some(14));
}

#[test]
fn test_script_explanation_wins_over_markup() {
    let html = Fixture::default().html().replace(
        "<script>",
        "<div class=\"explanation\" data-question=\"16\">Markup says otherwise.</div>\
         <div class=\"explanation\" data-question=\"q17\">Paragraph B: “It was valuable.”</div>\
         <script>",
    );
    let identity = infer_identity(SOURCE_NAME).unwrap();
    let ctx = DocCtx::new(identity.document_id(), SOURCE_NAME.to_string(), 1);
    let doc = accepted_document(DocumentFlow::default().run(&html, identity, &ctx));

    let q16 = doc.questions.iter().find(|q| q.number == 16).unwrap();
    let q17 = doc.questions.iter().find(|q| q.number == 17).unwrap();
    assert_eq!(q16.explanation.as_deref(), Some("Paragraph A says 'millennia'."));
    assert_eq!(q17.explanation.as_deref(), Some("Paragraph B: 'It was valuable.'"));
}

#[test]
fn test_duplicate_answer_key_keeps_first_value() {
    let html = Fixture::default()
        .html()
        .replace("q17: 'TRUE',", "q17: 'TRUE', Q17: 'FALSE',");
    let identity = infer_identity(SOURCE_NAME).unwrap();
    let ctx = DocCtx::new(identity.document_id(), SOURCE_NAME.to_string(), 1);
    let outcome = DocumentFlow::default().run(&html, identity, &ctx);

    assert!(outcome
        .findings
        .iter()
        .any(|f| !f.is_fatal() && f.question == Some(17)));
    let doc = accepted_document(outcome);
    let q17 = doc.questions.iter().find(|q| q.number == 17).unwrap();
    assert_eq!(q17.answer, AnswerValue::Single("TRUE".into()));
}

const PEOPLE_TABLE: &str = r#"
    <div class="group">
      <h4>Questions 14–15</h4>
      <p>Match each statement with the correct person, A, B or C.</p>
      <p>NB You may use any letter more than once.</p>
      <table class="matching-table">
        <thead><tr><th></th><th>A</th><th>B</th><th>C</th></tr></thead>
        <tbody>
          <tr><td><strong>14</strong> first kept bees for honey</td><td><input type="radio" name="q14" value="A"></td><td><input type="radio" name="q14" value="B"></td><td><input type="radio" name="q14" value="C"></td></tr>
          <tr><td><strong>15</strong> measured the value of pollination</td><td><input type="radio" name="q15" value="A"></td><td><input type="radio" name="q15" value="B"></td><td><input type="radio" name="q15" value="C"></td></tr>
        </tbody>
      </table>
    </div>"#;

#[test]
fn test_matching_table_about_people() {
    let doc = accepted_document(run_page(
        "16. P2 - Beekeepers.html",
        PEOPLE_TABLE,
        "const correctAnswers = { q14: 'A', q15: 'C' };",
    ));

    assert_eq!(doc.metadata.question_types, vec![QuestionType::FeatureMatching]);
    assert_eq!(doc.questions.len(), 2);
    assert_eq!(doc.questions[1].answer, AnswerValue::Single("C".into()));
    // 说明文字允许重复使用选项
    assert!(doc.questions.iter().all(|q| q.body.can_reuse() == Some(true)));
}

#[test]
fn test_reuse_from_instruction_without_attribute() {
    let questions = QUESTIONS
        .replace("__REUSE__", "")
        .replace(
            "<p>Which paragraph contains the following information?</p>",
            "<p>Which paragraph contains the following information?</p>\
             <p>NB You may use any letter more than once.</p>",
        );
    let html = format!(
        "<html><body>{}{}<script>{}</script></body></html>",
        PASSAGE,
        questions,
        ANSWERS.replace("__Q20__", "'Disease'")
    );
    let identity = infer_identity(SOURCE_NAME).unwrap();
    let ctx = DocCtx::new(identity.document_id(), SOURCE_NAME.to_string(), 1);
    let doc = accepted_document(DocumentFlow::default().run(&html, identity, &ctx));

    let q18 = doc.questions.iter().find(|q| q.number == 18).unwrap();
    assert_eq!(q18.question_type(), QuestionType::ParagraphMatching);
    assert_eq!(q18.body.can_reuse(), Some(true));
}

#[test]
fn test_question_number_beyond_range_is_rejected() {
    let questions = r#"
    <div class="group">
      <h4>Question 4294967295</h4>
      <p>Write TRUE, FALSE or NOT GIVEN.</p>
      <div class="question-item">
        <p><strong>4294967295</strong> Bees never sleep.</p>
        <label><input type="radio" name="q4294967295" value="TRUE"> TRUE</label>
        <label><input type="radio" name="q4294967295" value="FALSE"> FALSE</label>
        <label><input type="radio" name="q4294967295" value="NOT GIVEN"> NOT GIVEN</label>
      </div>
    </div>"#;
    let outcome = run_page(
        SOURCE_NAME,
        questions,
        "const correctAnswers = { q4294967295: 'TRUE' };",
    );

    assert!(!outcome.accepted());
    let fatal: Vec<_> = outcome.findings.iter().filter(|f| f.is_fatal()).collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].category, FindingCategory::Extraction);
    assert_eq!(fatal[0].question, Some(u32::MAX));
}

#[test]
fn test_absurd_number_range_is_rejected() {
    let questions = PEOPLE_TABLE
        .replace("Questions 14–15", "Questions 1-4000000000")
        .replace("<strong>14</strong>", "<strong>1-4000000000</strong>");
    let outcome = run_page(
        "16. P2 - Beekeepers.html",
        &questions,
        "const correctAnswers = { q14: 'A', q15: 'C' };",
    );

    assert!(!outcome.accepted());
    let fatal: Vec<_> = outcome.findings.iter().filter(|f| f.is_fatal()).collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].category, FindingCategory::Extraction);
}

#[tokio::test]
async fn test_app_rejects_duplicate_document_ids() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("013. P2 - Bees Again.html"), Fixture::default().html()).unwrap();
    std::fs::write(input.join(SOURCE_NAME), Fixture::default().html()).unwrap();

    let config = Config {
        input_root: input.display().to_string(),
        output_root: dir.path().join("output").display().to_string(),
        output_log_file: dir.path().join("ingest.log").display().to_string(),
        max_concurrent_docs: 2,
        ..Default::default()
    };
    let paths = config.paths();

    let report = App::initialize(config).await.unwrap().run().await.unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.rejected, 1);
    assert!(report.outcomes.iter().all(|o| o.id == "e013"));

    let rejected = report.outcomes.iter().find(|o| !o.accepted).unwrap();
    assert_eq!(rejected.findings.len(), 1);
    assert_eq!(rejected.findings[0].category, FindingCategory::Structural);

    let written: Vec<_> = std::fs::read_dir(&paths.json_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(written, vec![std::ffi::OsString::from("e013.json")]);
}
