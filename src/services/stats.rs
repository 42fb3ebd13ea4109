// 概览页统计

use serde::Serialize;

use crate::models::domain::{Product, Requirement, TaskItem, Version};

/// 概览卡片数据
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    /// 版本总数
    pub total: usize,
    /// 高优先级（HIGH / URGENT）需求数
    pub high_priority: usize,
    /// 未完成任务数
    pub pending_tasks: usize,
    /// 阻塞任务数
    pub risks: usize,
}

pub fn overview_stats(
    versions: &[Version],
    requirements: &[Requirement],
    tasks: &[TaskItem],
) -> OverviewStats {
    OverviewStats {
        total: versions.len(),
        high_priority: requirements
            .iter()
            .filter(|r| matches!(r.priority.as_str(), "HIGH" | "URGENT"))
            .count(),
        pending_tasks: tasks.iter().filter(|t| t.status != "DONE").count(),
        risks: tasks.iter().filter(|t| t.status == "BLOCKED").count(),
    }
}

/// 产品展示名 "{code} · {name}"
pub fn product_label(product: &Product) -> String {
    format!("{} · {}", product.code, product.name)
}

/// 版本展示名 "{versionCode} · {name}"
pub fn version_label(version: &Version) -> String {
    format!("{} · {}", version.version_code, version.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: &str) -> TaskItem {
        TaskItem {
            id: None,
            product_id: None,
            module_id: None,
            requirement_id: None,
            title: "t".to_string(),
            description: None,
            assignee: "a".to_string(),
            status: status.to_string(),
            due_date: None,
            estimate_hours: None,
        }
    }

    fn requirement(priority: &str) -> Requirement {
        Requirement {
            id: None,
            product_id: None,
            module_id: None,
            code: "R".to_string(),
            name: "r".to_string(),
            description: None,
            priority: priority.to_string(),
            status: "DRAFT".to_string(),
            version_id: None,
            owner: "o".to_string(),
            due_date: None,
            estimate_story_points: None,
        }
    }

    #[test]
    fn test_overview_stats() {
        let stats = overview_stats(
            &[],
            &[requirement("HIGH"), requirement("URGENT"), requirement("LOW")],
            &[task("DONE"), task("BLOCKED"), task("TODO")],
        );
        assert_eq!(
            stats,
            OverviewStats {
                total: 0,
                high_priority: 2,
                pending_tasks: 2,
                risks: 1,
            }
        );
    }
}
