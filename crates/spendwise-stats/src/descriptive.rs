/// Descriptive statistics summarizing a dataset.
///
/// This structure contains common measures of central tendency, dispersion,
/// and spread for a dataset of `f64` values.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    /// The number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The median value of the dataset.
    pub median: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
    /// The normalized standard deviation (`std_dev / range`).
    pub normalized_std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// Non-finite values (`NaN`, `±inf`) are skipped.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one finite value
    /// * `None` - otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// # use spendwise_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, f64::NAN, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.count, 5);
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = sorted_values[count / 2];
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();
        // Scale-adaptive epsilon so near-constant data reads as zero spread
        let normalized_std_dev = if (max - min).abs() <= mean.abs() * f64::EPSILON {
            0.0
        } else {
            std_dev / (max - min)
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
            normalized_std_dev,
        })
    }

    /// Returns the coefficient of variation (`std_dev / |mean|`).
    ///
    /// Returns `None` when the mean is too close to zero for the ratio to be
    /// meaningful. Callers decide how to interpret that case.
    ///
    /// ```
    /// # use spendwise_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([2.0, 2.0, 2.0]).unwrap();
    /// assert_eq!(stats.coefficient_of_variation(), Some(0.0));
    ///
    /// let stats = DescriptiveStats::new([-1.0, 1.0]).unwrap();
    /// assert_eq!(stats.coefficient_of_variation(), None);
    /// ```
    #[must_use]
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        if self.mean.abs() <= f64::EPSILON {
            None
        } else {
            Some(self.std_dev / self.mean.abs())
        }
    }
}
