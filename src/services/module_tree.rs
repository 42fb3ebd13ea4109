// ============================================================================
// 功能模块层级：扁平 arena（id → 节点），父指针为 id
// 路径在构建时一次性算好；遇到环或层级过深返回 CycleDetected
// ============================================================================

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::domain::ProductModule;
use crate::models::dtos::SelectOption;
use crate::services::filter::Filter;
use crate::utils::error::{AppError, AppResult};

/// 向上追溯父级的最大跳数
pub const MAX_PATH_DEPTH: usize = 6;

/// 路径分隔符
const PATH_SEPARATOR: &str = " / ";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("模块层级存在循环引用：{module_id}")]
pub struct CycleDetected {
    pub module_id: i64,
}

impl From<CycleDetected> for AppError {
    fn from(err: CycleDetected) -> Self {
        AppError::CycleDetected {
            module_id: err.module_id,
        }
    }
}

#[derive(Debug, Clone)]
struct ModuleNode {
    product_id: i64,
    parent_id: Option<i64>,
    level: u8,
    name: String,
    sort_order: i32,
}

/// 一次模块快照上的层级视图
#[derive(Debug, Clone, Default)]
pub struct ModuleTree {
    nodes: HashMap<i64, ModuleNode>,
    /// 保持后端返回顺序，排序时作为次序依据
    order: Vec<i64>,
    paths: HashMap<i64, Result<String, CycleDetected>>,
}

impl ModuleTree {
    pub fn build(modules: &[ProductModule]) -> Self {
        let mut tree = ModuleTree::default();
        for module in modules {
            let Some(id) = module.id else { continue };
            if tree
                .nodes
                .insert(
                    id,
                    ModuleNode {
                        product_id: module.product_id,
                        parent_id: module.parent_id,
                        level: module.level,
                        name: module.name.clone(),
                        sort_order: module.sort_order.unwrap_or(0),
                    },
                )
                .is_none()
            {
                tree.order.push(id);
            }
        }

        let paths: HashMap<i64, Result<String, CycleDetected>> = tree
            .order
            .iter()
            .map(|id| (*id, tree.walk(*id)))
            .collect();
        for (id, path) in &paths {
            if path.is_err() {
                log::warn!("模块 {} 的父级链异常，无法生成路径", id);
            }
        }
        tree.paths = paths;
        tree
    }

    fn walk(&self, id: i64) -> Result<String, CycleDetected> {
        let Some(node) = self.nodes.get(&id) else {
            return Ok(String::new());
        };
        let mut names = vec![node.name.as_str()];
        let mut seen = HashSet::from([id]);
        let mut cursor = node.parent_id;
        let mut hops = 0;
        while let Some(parent_id) = cursor {
            hops += 1;
            if hops > MAX_PATH_DEPTH || !seen.insert(parent_id) {
                return Err(CycleDetected { module_id: id });
            }
            // 父级缺失时止步
            let Some(parent) = self.nodes.get(&parent_id) else {
                break;
            };
            names.push(parent.name.as_str());
            cursor = parent.parent_id;
        }
        names.reverse();
        Ok(names.join(PATH_SEPARATOR))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    /// 展示路径，如 "账户 / 登录 / 短信验证"；未知 id 返回空串
    pub fn build_path(&self, id: i64) -> Result<String, CycleDetected> {
        match self.paths.get(&id) {
            Some(path) => path.clone(),
            None => Ok(String::new()),
        }
    }

    /// 路径不可用时退回模块自身名称
    pub fn label(&self, id: i64) -> String {
        match self.build_path(id) {
            Ok(path) if !path.is_empty() => path,
            _ => self
                .nodes
                .get(&id)
                .map(|node| node.name.clone())
                .unwrap_or_default(),
        }
    }

    fn sorted_ids(&self, predicate: impl Fn(&ModuleNode) -> bool) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.nodes.get(id).is_some_and(&predicate))
            .collect();
        ids.sort_by_key(|id| self.nodes.get(id).map(|node| node.sort_order).unwrap_or(0));
        ids
    }

    fn options_for(&self, ids: Vec<i64>) -> Vec<SelectOption> {
        ids.into_iter()
            .map(|id| SelectOption::new(id.to_string(), self.label(id)))
            .collect()
    }

    /// 某产品下的模块选项（All 时为全部模块），按 sortOrder 升序
    pub fn module_options(&self, product: &Filter<i64>) -> Vec<SelectOption> {
        let ids = self.sorted_ids(|node| product.admits(&node.product_id));
        self.options_for(ids)
    }

    /// 上级模块候选：同产品、层级为 level - 1
    pub fn parent_options(&self, product_id: Option<i64>, level: u8) -> Vec<SelectOption> {
        let Some(product_id) = product_id else {
            return Vec::new();
        };
        if level <= 1 {
            return Vec::new();
        }
        let ids = self
            .sorted_ids(|node| node.product_id == product_id && node.level == level - 1);
        self.options_for(ids)
    }

    /// 层级规则：1..=3；一级无父级；二、三级父级须存在、同产品、层级恰好低一级
    pub fn validate_hierarchy(
        &self,
        product_id: i64,
        parent_id: Option<i64>,
        level: u8,
    ) -> AppResult<()> {
        if !(1..=3).contains(&level) {
            return Err(AppError::validation("模块层级必须为1-3"));
        }
        if level == 1 {
            if parent_id.is_some() {
                return Err(AppError::validation("一级模块不允许设置父级"));
            }
            return Ok(());
        }
        let Some(parent_id) = parent_id else {
            return Err(AppError::validation("二级/三级模块必须选择父级"));
        };
        let Some(parent) = self.nodes.get(&parent_id) else {
            return Err(AppError::validation("父级模块不存在"));
        };
        if parent.product_id != product_id {
            return Err(AppError::validation("父级模块不属于该产品"));
        }
        if parent.level != level - 1 {
            return Err(AppError::validation("父级模块层级不匹配"));
        }
        Ok(())
    }
}
