//! 评分 - 纯计算，无副作用

use std::collections::HashMap;

use tracing::info;

use crate::models::{EvaluationResult, Grade, QuestionResult, QuizQuestion};

/// 对照正确答案评分
///
/// 答案按题目编号的字符串形式查找；未作答视为空字符串；比较前统一转大写
pub fn evaluate(questions: &[QuizQuestion], answers: &HashMap<String, String>) -> EvaluationResult {
    let total_questions = questions.len();
    info!("开始评分，共 {} 题", total_questions);

    let detailed_results: Vec<QuestionResult> = questions
        .iter()
        .map(|q| {
            let question_id = q.id.to_string();
            let user_answer = answers.get(&question_id).cloned().unwrap_or_default();
            let correct_answer = q.mcq.correct_answer.as_str();
            let is_correct = user_answer.to_uppercase() == correct_answer.to_uppercase();

            QuestionResult {
                question_id,
                question: q.mcq.question.clone(),
                user_answer,
                correct_answer: correct_answer.to_string(),
                is_correct,
                explanation: q.mcq.explanation.clone(),
                topic: q.mcq.topic.clone(),
            }
        })
        .collect();

    let correct_answers = detailed_results.iter().filter(|r| r.is_correct).count();
    let percentage = if total_questions > 0 {
        correct_answers as f64 / total_questions as f64 * 100.0
    } else {
        0.0
    };

    EvaluationResult {
        total_questions,
        correct_answers,
        score_percentage: round2(percentage),
        grade: Grade::from_percentage(percentage),
        detailed_results,
        feedback: feedback_for(percentage).to_string(),
        error: None,
    }
}

/// 反馈文本，四档
pub fn feedback_for(score: f64) -> &'static str {
    if score >= 90.0 {
        "Excellent work! You have mastered the concepts."
    } else if score >= 70.0 {
        "Good job! Review the topics you missed for improvement."
    } else if score >= 50.0 {
        "Fair performance. Focus on studying the weak areas."
    } else {
        "Needs improvement. Consider reviewing all topics thoroughly."
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerOption;
    use crate::test_support::sample_mcq;

    fn quiz(answers: &[AnswerOption]) -> Vec<QuizQuestion> {
        answers
            .iter()
            .enumerate()
            .map(|(i, answer)| QuizQuestion {
                id: i as i64 + 1,
                mcq: sample_mcq("Topic", &format!("Q{}", i + 1), *answer),
            })
            .collect()
    }

    fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_empty_quiz() {
        let result = evaluate(&[], &HashMap::new());
        assert_eq!(result.total_questions, 0);
        assert_eq!(result.correct_answers, 0);
        assert_eq!(result.score_percentage, 0.0);
        assert_eq!(result.grade, Grade::F);
        assert!(result.detailed_results.is_empty());
    }

    #[test]
    fn test_case_insensitive_match() {
        let questions = quiz(&[AnswerOption::B]);
        let result = evaluate(&questions, &answers(&[("1", "b")]));
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.grade, Grade::APlus);
        assert_eq!(result.detailed_results[0].user_answer, "b");
        assert_eq!(result.detailed_results[0].correct_answer, "B");
    }

    #[test]
    fn test_missing_answer_counts_as_wrong() {
        let questions = quiz(&[AnswerOption::A, AnswerOption::C, AnswerOption::D]);
        let result = evaluate(&questions, &answers(&[("1", "A"), ("3", "a")]));
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.detailed_results[1].user_answer, "");
        assert!(!result.detailed_results[1].is_correct);
        assert_eq!(result.score_percentage, 33.33);
        assert_eq!(result.grade, Grade::F);
    }

    #[test]
    fn test_rounding_and_grade_use_unrounded_score() {
        // 2/3 = 66.666… → C, 显示 66.67
        let questions = quiz(&[AnswerOption::A, AnswerOption::A, AnswerOption::A]);
        let result = evaluate(&questions, &answers(&[("1", "A"), ("2", "A"), ("3", "B")]));
        assert_eq!(result.score_percentage, 66.67);
        assert_eq!(result.grade, Grade::C);
        assert_eq!(result.feedback, "Fair performance. Focus on studying the weak areas.");
    }

    #[test]
    fn test_feedback_tiers() {
        assert_eq!(feedback_for(95.0), "Excellent work! You have mastered the concepts.");
        assert_eq!(feedback_for(80.0), "Good job! Review the topics you missed for improvement.");
        assert_eq!(feedback_for(50.0), "Fair performance. Focus on studying the weak areas.");
        assert_eq!(
            feedback_for(10.0),
            "Needs improvement. Consider reviewing all topics thoroughly."
        );
    }
}
