//! Политика изменения размера словаря.
//!
//! Флаг разрешения resize, коэффициент принудительного роста и затравка
//! хеш-функции — явная конфигурация конкретного словаря, а не глобальное
//! состояние процесса.

use serde::{Deserialize, Serialize};

/// Начальный размер таблицы (степень двойки).
pub const DICT_HT_INITIAL_SIZE: usize = 4;

/// Коэффициент принудительного роста: даже при выключенном resize
/// таблица растёт, когда `used / size` превышает это значение.
pub const DICT_FORCE_RESIZE_RATIO: usize = 5;

/// Затравка хеш-функции по умолчанию.
pub const DICT_HASH_SEED: u64 = 5381;

/// Параметры словаря.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictConfig {
    /// Размер первой аллокации bucket-массива (округляется вверх до
    /// степени двойки).
    pub initial_size: usize,
    /// Порог `used / size` (целочисленное деление), после которого рост
    /// выполняется даже при `resize_enabled = false`.
    pub force_resize_ratio: usize,
    /// Затравка хеш-функции. Менять имеет смысл только на пустом словаре.
    pub hash_seed: u64,
    /// Разрешён ли плановый resize. Выключается, например, на время
    /// fork-подобных операций, чтобы не трогать много памяти.
    pub resize_enabled: bool,
}

impl Default for DictConfig {
    fn default() -> Self {
        DictConfig {
            initial_size: DICT_HT_INITIAL_SIZE,
            force_resize_ratio: DICT_FORCE_RESIZE_RATIO,
            hash_seed: DICT_HASH_SEED,
            resize_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DictConfig::default();
        assert_eq!(c.initial_size, 4);
        assert_eq!(c.force_resize_ratio, 5);
        assert!(c.resize_enabled);
    }
}
