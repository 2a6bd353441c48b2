//! Localized confirmation text.
//!
//! The audit chat reads Chinese; originating chats read Malay. Templates are
//! keyed by decision and language, with an extended sentence for rejections
//! caused by the daily capacity limit.

use crate::action::Decision;
use crate::metadata::RequestMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Malay, for the chats applicants sit in.
    Ms,
    /// Chinese, for the admin/audit chat.
    Zh,
}

/// Compose the confirmation line for a decided request.
///
/// `range_label` is the pre-rendered ` (…)` suffix, empty when the request
/// carries no date range. The capacity-reject variant is only used when the
/// metadata flags it and a range label is available.
pub fn confirmation_text(
    decision: Decision,
    language: Language,
    mention_tag: &str,
    range_label: &str,
    approver: &str,
    metadata: &RequestMetadata,
) -> String {
    let capacity_reject = metadata.is_capacity_reject() && !range_label.trim().is_empty();
    match (language, decision) {
        (Language::Zh, Decision::Approve) => {
            format!("{mention_tag} 的请假申请已被 {approver} 接受。")
        }
        (Language::Zh, Decision::Reject) if capacity_reject => {
            format!("{mention_tag} 的请假申请因当天请假人数已达上限（3人），已被 {approver} 拒绝。")
        }
        (Language::Zh, Decision::Reject) => {
            format!("{mention_tag} 的请假申请已被 {approver} 拒绝。")
        }
        (Language::Ms, Decision::Approve) => {
            format!("{mention_tag} permohonan cuti{range_label} telah diluluskan oleh {approver}.")
        }
        (Language::Ms, Decision::Reject) if capacity_reject => {
            format!(
                "{mention_tag} permohonan cuti baharu pada{range_label} telah ditolak oleh {approver} (kerana mencapai had maksimum 3 orang sehari)."
            )
        }
        (Language::Ms, Decision::Reject) => {
            format!("{mention_tag} permohonan cuti{range_label} telah ditolak oleh {approver}.")
        }
    }
}

/// Follow-up explanation sent when the backend reports a capacity-full
/// rejection after the fact.
pub fn capacity_follow_up(metadata: &RequestMetadata) -> String {
    let date_range = metadata
        .date_range_label
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("the requested dates");
    format!(
        "Permohonan cuti baharu pada {date_range} (kerana mencapai had maksimum 3 orang sehari)"
    )
}

/// The fixed command-surface menu, answered to `help`/`h`.
pub fn help_menu() -> String {
    [
        "请假指令帮助",
        "",
        "使用以下快捷方式查看已批准的请假记录:",
        "- 'leave' 或 'l'：显示当前月份的已批准请假记录。",
        "- 'leave11'、'leave 11'、'l11' 或 'l 11'：显示指定月份的已批准请假。如果该月份在今年已过，将自动使用下一年。",
        "- '25leave10'、'25 leave 10'、'25l10' 或 '25 l 10'：以年份优先的格式查看指定月份的已批准请假（例如：2025年10月）。",
        "- '25leave'、'25 leave'、'25l' 或 '25 l'：查看该年份所有已批准的请假（例如：2025年）。",
        "",
        "快速审批快捷方式:",
        "- 'y'、'yes'、'ok'、'okay' 或 'k'：表示批准。",
        "- 'no'、'n'、'cannot' 或 'not ok'：表示拒绝。",
        "- 也可以直接回复某条请假请求的对话，输入上述任意审批指令来快速处理该请求。",
        "",
        "随时发送 'help' 或 'h' 可再次查看此菜单。",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Language, capacity_follow_up, confirmation_text, help_menu};
    use crate::action::Decision;
    use crate::metadata::RequestMetadata;

    #[test]
    fn approve_templates_name_approver_and_applicant() {
        let text = confirmation_text(
            Decision::Approve,
            Language::Zh,
            "@60123456789",
            "",
            "Ms Tan",
            &RequestMetadata::default(),
        );
        assert!(text.contains("@60123456789"));
        assert!(text.contains("Ms Tan"));
        assert!(text.contains("接受"));

        let text = confirmation_text(
            Decision::Approve,
            Language::Ms,
            "@60123456789",
            " (1 Jan - 3 Jan)",
            "Ms Tan",
            &RequestMetadata::default(),
        );
        assert!(text.contains("diluluskan"));
        assert!(text.contains("(1 Jan - 3 Jan)"));
    }

    #[test]
    fn capacity_reject_needs_both_flag_and_range() {
        let flagged = RequestMetadata::from_value(serde_json::json!({
            "reject_reason": "capacity_full",
        }));
        let with_range = confirmation_text(
            Decision::Reject,
            Language::Ms,
            "Pemohon",
            " (1 Jan)",
            "Admin",
            &flagged,
        );
        assert!(with_range.contains("had maksimum"));

        let no_range =
            confirmation_text(Decision::Reject, Language::Ms, "Pemohon", "", "Admin", &flagged);
        assert!(!no_range.contains("had maksimum"));

        let no_flag = confirmation_text(
            Decision::Reject,
            Language::Zh,
            "Pemohon",
            " (1 Jan)",
            "Admin",
            &RequestMetadata::default(),
        );
        assert!(!no_flag.contains("上限"));
        assert!(no_flag.contains("拒绝"));
    }

    #[test]
    fn follow_up_falls_back_when_range_is_missing() {
        let with_range = capacity_follow_up(&RequestMetadata::from_value(serde_json::json!({
            "date_range_label": "5 Feb - 6 Feb",
        })));
        assert!(with_range.contains("5 Feb - 6 Feb"));

        let without = capacity_follow_up(&RequestMetadata::default());
        assert!(without.contains("the requested dates"));
    }

    #[test]
    fn help_menu_covers_the_command_surface() {
        let menu = help_menu();
        for token in ["leave", "l11", "yes", "not ok", "help"] {
            assert!(menu.contains(token), "menu should mention {token}");
        }
    }
}
