//! # 选择状态机
//!
//! 持有候选列表、选择键和当前高亮项，把方向键翻译成高亮移动或确认。
//!
//! - `Idle`：没有候选
//! - `Active`：至少一个候选，恰好一个高亮
//! - `Confirmed`：已确认，等待调用方取结果（终态，直到列表被替换或清空）

use log::debug;

// 虚拟键码
const VK_RETURN: u32 = 0x0D;
const VK_LEFT: u32 = 0x25;
const VK_UP: u32 = 0x26;
const VK_RIGHT: u32 = 0x27;
const VK_DOWN: u32 = 0x28;

/// 一个候选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    /// 选择键，`None` 表示该位置没有分配键
    pub key: Option<char>,
}

/// 状态机的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Idle,
    Active,
    Confirmed,
}

/// 状态机能理解的按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Right,
    Up,
    Down,
    Confirm,
}

impl NavKey {
    /// 虚拟键码 → 导航键；其他键返回 `None`
    pub fn from_vkey(vkey: u32) -> Option<Self> {
        match vkey {
            VK_LEFT => Some(NavKey::Left),
            VK_RIGHT => Some(NavKey::Right),
            VK_UP => Some(NavKey::Up),
            VK_DOWN => Some(NavKey::Down),
            VK_RETURN => Some(NavKey::Confirm),
            _ => None,
        }
    }
}

/// 按键处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyResult {
    /// 按键被消费，不再传给宿主
    pub eaten: bool,
    /// 高亮项变了，需要重绘（不需要重新布局）
    pub need_refresh: bool,
}

impl KeyResult {
    const IGNORED: KeyResult = KeyResult { eaten: false, need_refresh: false };
}

// ============================================================
// CandidateList
// ============================================================

/// 候选列表 + 高亮 + 确认标志
#[derive(Debug, Clone)]
pub struct CandidateList {
    items: Vec<Candidate>,
    current: usize,
    per_row: usize,
    confirmed: bool,
}

impl Default for CandidateList {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateList {
    pub fn new() -> Self {
        Self { items: Vec::new(), current: 0, per_row: 1, confirmed: false }
    }

    /// 整体替换候选；`keys` 按位置对应，缺失或 `'\0'` 表示无选择键。
    /// 高亮回到 0，确认标志清除。
    pub fn set_items<S: Into<String>>(&mut self, items: impl IntoIterator<Item = S>, keys: &[char]) {
        self.items = items
            .into_iter()
            .enumerate()
            .map(|(i, text)| Candidate {
                text: text.into(),
                key: keys.get(i).copied().filter(|&k| k != '\0'),
            })
            .collect();
        self.current = 0;
        self.confirmed = false;
    }

    /// 追加一项，不改变高亮
    pub fn add(&mut self, text: impl Into<String>, key: Option<char>) {
        self.items.push(Candidate { text: text.into(), key });
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.current = 0;
        self.confirmed = false;
    }

    pub fn items(&self) -> &[Candidate] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> SelectionState {
        if self.items.is_empty() {
            SelectionState::Idle
        } else if self.confirmed {
            SelectionState::Confirmed
        } else {
            SelectionState::Active
        }
    }

    pub fn current_sel(&self) -> usize {
        self.current
    }

    /// 设置高亮；越界归一化为 0。返回高亮是否改变
    pub fn set_current_sel(&mut self, sel: usize) -> bool {
        let sel = if sel >= self.items.len() { 0 } else { sel };
        let changed = sel != self.current;
        self.current = sel;
        changed
    }

    /// 当前高亮项的选择键
    pub fn current_sel_key(&self) -> Option<char> {
        self.items.get(self.current).and_then(|c| c.key)
    }

    /// 选择键 → 候选位置
    pub fn index_of_key(&self, key: char) -> Option<usize> {
        self.items.iter().position(|c| c.key == Some(key))
    }

    pub fn has_result(&self) -> bool {
        self.confirmed
    }

    pub fn cand_per_row(&self) -> usize {
        self.per_row
    }

    /// 每行候选数，0 按 1 处理。返回是否改变（改变时调用方需要重新布局）
    pub fn set_cand_per_row(&mut self, n: usize) -> bool {
        let n = n.max(1);
        let changed = n != self.per_row;
        self.per_row = n;
        changed
    }

    /// 处理一个虚拟键码
    pub fn handle_key(&mut self, vkey: u32) -> KeyResult {
        match NavKey::from_vkey(vkey) {
            Some(key) => self.navigate(key),
            None => KeyResult::IGNORED,
        }
    }

    /// 处理导航键。移动键只在高亮真的改变时算作消费，确认键总是消费
    pub fn navigate(&mut self, key: NavKey) -> KeyResult {
        if self.state() != SelectionState::Active {
            return match (self.state(), key) {
                (SelectionState::Confirmed, NavKey::Confirm) => KeyResult { eaten: true, need_refresh: false },
                _ => KeyResult::IGNORED,
            };
        }

        let len = self.items.len();
        let old = self.current;
        match key {
            NavKey::Left => {
                if self.current > 0 {
                    self.current -= 1;
                }
            }
            NavKey::Right => {
                if self.current + 1 < len {
                    self.current += 1;
                }
            }
            NavKey::Up => {
                if self.current >= self.per_row {
                    self.current -= self.per_row;
                }
            }
            NavKey::Down => {
                if self.current + self.per_row < len {
                    self.current += self.per_row;
                }
            }
            NavKey::Confirm => {
                self.confirmed = true;
                debug!("[Select] 确认第 {} 项", self.current);
                return KeyResult { eaten: true, need_refresh: false };
            }
        }

        if self.current != old {
            debug!("[Select] {:?}: {} → {}", key, old, self.current);
            KeyResult { eaten: true, need_refresh: true }
        } else {
            KeyResult::IGNORED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> CandidateList {
        let mut l = CandidateList::new();
        let keys: Vec<char> = ('1'..='9').take(items.len()).collect();
        l.set_items(items.iter().copied(), &keys);
        l
    }

    #[test]
    fn test_down_up_scenario() {
        let mut l = list(&["one", "two", "three"]);
        assert_eq!(l.current_sel(), 0);
        assert!(l.navigate(NavKey::Down).eaten);
        assert_eq!(l.current_sel(), 1);
        assert!(l.navigate(NavKey::Down).eaten);
        assert_eq!(l.current_sel(), 2);
        // 最后一行：无操作
        assert_eq!(l.navigate(NavKey::Down), KeyResult::IGNORED);
        assert_eq!(l.current_sel(), 2);
        assert!(l.navigate(NavKey::Up).need_refresh);
        assert_eq!(l.current_sel(), 1);
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut l = list(&["a", "b", "c", "d", "e"]);
        l.set_cand_per_row(2);
        assert!(!l.navigate(NavKey::Left).eaten);
        assert!(!l.navigate(NavKey::Up).eaten);
        assert_eq!(l.current_sel(), 0);

        l.set_current_sel(4);
        assert!(!l.navigate(NavKey::Right).eaten);
        assert!(!l.navigate(NavKey::Down).eaten);
        assert_eq!(l.current_sel(), 4);

        // 3 + 2 = 5 越界
        l.set_current_sel(3);
        assert!(!l.navigate(NavKey::Down).eaten);
        assert!(l.navigate(NavKey::Up).eaten);
        assert_eq!(l.current_sel(), 1);
    }

    #[test]
    fn test_index_stays_in_range() {
        let mut l = list(&["a", "b", "c", "d"]);
        l.set_cand_per_row(3);
        let keys = [NavKey::Right, NavKey::Down, NavKey::Down, NavKey::Right, NavKey::Up, NavKey::Left, NavKey::Left];
        for step in 0..200 {
            l.navigate(keys[(step * 7 + step / 3) % keys.len()]);
            assert!(l.current_sel() < l.len());
        }
    }

    #[test]
    fn test_set_items_resets_selection_and_result() {
        let mut l = list(&["a", "b", "c"]);
        l.navigate(NavKey::Right);
        l.navigate(NavKey::Confirm);
        assert_eq!(l.state(), SelectionState::Confirmed);
        assert!(l.has_result());

        l.set_items(["x", "y"], &['a', 'b']);
        assert_eq!(l.current_sel(), 0);
        assert!(!l.has_result());
        assert_eq!(l.state(), SelectionState::Active);
        // 选择键取自参数
        assert_eq!(l.current_sel_key(), Some('a'));

        l.set_items(Vec::<String>::new(), &[]);
        assert_eq!(l.state(), SelectionState::Idle);
    }

    #[test]
    fn test_confirm_and_other_keys() {
        let mut l = list(&["a", "b"]);
        let r = l.handle_key(0x0D);
        assert_eq!(r, KeyResult { eaten: true, need_refresh: false });
        assert!(l.has_result());
        // 确认后是终态
        assert!(!l.handle_key(0x27).eaten);
        assert!(l.handle_key(0x0D).eaten);
        // 非导航键不处理
        let mut l = list(&["a", "b"]);
        assert_eq!(l.handle_key(0x41), KeyResult::IGNORED);
    }

    #[test]
    fn test_idle_ignores_everything() {
        let mut l = CandidateList::new();
        for vk in [0x25, 0x26, 0x27, 0x28, 0x0D] {
            assert!(!l.handle_key(vk).eaten);
        }
        assert!(!l.has_result());
    }

    #[test]
    fn test_set_current_sel_out_of_range_is_zero() {
        let mut l = list(&["a", "b", "c"]);
        l.set_current_sel(2);
        assert!(l.set_current_sel(7));
        assert_eq!(l.current_sel(), 0);
    }

    #[test]
    fn test_keys_and_duplicates() {
        let mut l = CandidateList::new();
        l.set_items(["好", "好", "号"], &['1', '\0']);
        assert_eq!(l.len(), 3);
        assert_eq!(l.items()[1].key, None);
        assert_eq!(l.items()[2].key, None);
        assert_eq!(l.index_of_key('1'), Some(0));
        l.add("豪", Some('4'));
        assert_eq!(l.index_of_key('4'), Some(3));
        assert_eq!(l.current_sel(), 0);
    }

    #[test]
    fn test_cand_per_row_change() {
        let mut l = list(&["a", "b", "c"]);
        l.set_current_sel(2);
        assert!(!l.set_cand_per_row(1));
        assert!(!l.set_cand_per_row(0));
        assert!(l.set_cand_per_row(3));
        // 不重置选中
        assert_eq!(l.current_sel(), 2);
    }
}
