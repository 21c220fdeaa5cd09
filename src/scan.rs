//! Полный обход словаря курсором без состояния (`scan`).
//!
//! Курсор — одно число: биты индекса бакета, инкрементируемые в
//! обратном порядке (старшие биты растут первыми). Такой порядок
//! гарантирует, что ключ, присутствовавший в словаре от начала до конца
//! серии вызовов, будет выдан хотя бы один раз, даже если таблица между
//! вызовами выросла или сжалась; платой за это являются возможные
//! повторные выдачи, дедупликация — забота вызывающего.

use crate::{
    dict::Dict,
    table::HashTable,
    types::{DictType, DictValue},
};

impl<T: DictType> Dict<T> {
    /// Один шаг обхода: выдаёт записи бакета (бакетов), адресуемых
    /// курсором, и возвращает курсор следующего шага. Обход начинается
    /// с курсора 0 и завершён, когда функция снова вернула 0.
    ///
    /// Во время рехеширования курсор адресует бакет меньшей из двух
    /// таблиц, а из большей выдаются все бакеты-расширения того же
    /// курсора: в них мигрируют (или из них мигрировали) те же ключи.
    pub fn scan<F>(&self, cursor: u64, mut visit: F) -> u64
    where
        F: FnMut(&T::Key, &DictValue<T::Val>),
    {
        if self.len() == 0 {
            return 0;
        }
        let mut v = cursor;

        if !self.is_rehashing() {
            let m0 = self.ht[0].size_mask as u64;

            Self::scan_bucket(&self.ht[0], (v & m0) as usize, &mut visit);

            // Обратно-двоичный инкремент: поднимаем необрабатываемые
            // биты, прибавляем единицу к развёрнутому курсору.
            v |= !m0;
            v = v.reverse_bits().wrapping_add(1).reverse_bits();
            return v;
        }

        let (mut t0, mut t1) = (&self.ht[0], &self.ht[1]);
        if t0.size() > t1.size() {
            std::mem::swap(&mut t0, &mut t1);
        }
        let m0 = t0.size_mask as u64;
        let m1 = t1.size_mask as u64;

        Self::scan_bucket(t0, (v & m0) as usize, &mut visit);

        // Все бакеты большей таблицы, являющиеся битовыми расширениями
        // текущего курсора меньшей.
        loop {
            Self::scan_bucket(t1, (v & m1) as usize, &mut visit);

            v |= !m1;
            v = v.reverse_bits().wrapping_add(1).reverse_bits();

            if v & (m0 ^ m1) == 0 {
                break;
            }
        }
        v
    }

    fn scan_bucket<F>(table: &HashTable<T::Key, T::Val>, slot: usize, visit: &mut F)
    where
        F: FnMut(&T::Key, &DictValue<T::Val>),
    {
        let mut cur = table.buckets[slot].as_deref();
        while let Some(e) = cur {
            visit(&e.key, &e.val);
            cur = e.next.as_deref();
        }
    }
}
