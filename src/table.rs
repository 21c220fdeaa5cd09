//! Bucket-массив и звено цепочки коллизий.

use crate::types::DictValue;

/// Один элемент в цепочке коллизий. Владеет хвостом цепочки.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) val: DictValue<V>,
    pub(crate) next: Option<Box<Entry<K, V>>>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, val: DictValue<V>, next: Option<Box<Entry<K, V>>>) -> Box<Self> {
        Box::new(Entry { key, val, next })
    }
}

/// Одна таблица: вектор бакетов, маска размера и число занятых элементов.
#[derive(Debug)]
pub(crate) struct HashTable<K, V> {
    pub(crate) buckets: Vec<Option<Box<Entry<K, V>>>>,
    pub(crate) size_mask: usize,
    pub(crate) used: usize,
}

impl<K, V> HashTable<K, V> {
    /// Таблица без bucket-массива (состояние до первой вставки).
    pub(crate) fn unallocated() -> Self {
        HashTable {
            buckets: Vec::new(),
            size_mask: 0,
            used: 0,
        }
    }

    /// Создаёт обнулённую таблицу размера `sz` (степень двойки).
    pub(crate) fn with_capacity(sz: usize) -> Self {
        debug_assert!(sz.is_power_of_two());

        let mut buckets = Vec::with_capacity(sz);
        buckets.resize_with(sz, || None);

        HashTable {
            buckets,
            size_mask: sz - 1,
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn is_unallocated(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Сбрасывает таблицу в неаллоцированное состояние. Цепочки к этому
    /// моменту уже должны быть разобраны.
    pub(crate) fn reset(&mut self) {
        self.buckets = Vec::new();
        self.size_mask = 0;
        self.used = 0;
    }

    /// Длина цепочки в бакете `slot`.
    pub(crate) fn chain_len(&self, slot: usize) -> usize {
        let mut len = 0;
        let mut cur = &self.buckets[slot];
        while let Some(e) = cur {
            len += 1;
            cur = &e.next;
        }
        len
    }
}
