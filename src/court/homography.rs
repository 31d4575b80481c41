// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
/// 单应性变换工具模块
/// 实现类似于 cv2::findHomography (最小二乘, 无RANSAC) 的功能
use ndarray::{Array1, Array2};

use crate::detection::Point2;
use crate::error::{AnalyticsError, AnalyticsResult};

/// 奇异性判定阈值
const SINGULAR_EPS: f64 = 1e-10;

/// 点云共线判定阈值 (协方差最小/最大特征值之比)
const COLLINEAR_RATIO: f64 = 1e-6;

/// 单应性矩阵 (3x3)
/// | m00 m01 m02 |
/// | m10 m11 m12 |
/// | m20 m21 m22 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [[f64; 3]; 3],
}

impl Homography {
    /// 单位矩阵
    pub fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// 从3x3数组创建
    pub fn from_array(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    /// 转换为3x3数组
    pub fn to_array(&self) -> [[f64; 3]; 3] {
        self.m
    }

    /// 应用变换到点 (x, y); 映射到无穷远时返回 None
    pub fn transform_point(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let m = &self.m;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        if w.abs() < SINGULAR_EPS {
            return None;
        }
        let new_x = (m[0][0] * x + m[0][1] * y + m[0][2]) / w;
        let new_y = (m[1][0] * x + m[1][1] * y + m[1][2]) / w;
        Some((new_x, new_y))
    }

    pub fn apply(&self, p: Point2) -> Option<Point2> {
        self.transform_point(p.x, p.y).map(|(x, y)| Point2::new(x, y))
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// 计算逆矩阵 (伴随矩阵法)
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.m;
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPS * SINGULAR_EPS {
            return None; // 矩阵不可逆
        }

        let inv_det = 1.0 / det;
        let inv = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * inv_det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * inv_det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) * inv_det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * inv_det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * inv_det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) * inv_det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * inv_det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * inv_det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) * inv_det,
            ],
        ];
        Some(Self { m: inv }.normalized())
    }

    /// 矩阵组合 (self * other): 先应用 other, 再应用 self
    pub fn compose(&self, other: &Self) -> Self {
        let mut m = [[0.0; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Self { m }
    }

    /// 归一化使 m22 = 1
    fn normalized(self) -> Self {
        let s = self.m[2][2];
        if s.abs() < SINGULAR_EPS {
            return self;
        }
        Self {
            m: self.m.map(|row| row.map(|v| v / s)),
        }
    }
}

/// Hartley 归一化: 质心移到原点, 平均距离缩放为 √2
fn normalization_transform(points: &[Point2]) -> Option<Homography> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let centroid = Point2::new(cx, cy);
    let mean_dist = points.iter().map(|p| p.distance(&centroid)).sum::<f64>() / n;
    if mean_dist < SINGULAR_EPS {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    Some(Homography::from_array([
        [s, 0.0, -s * cx],
        [0.0, s, -s * cy],
        [0.0, 0.0, 1.0],
    ]))
}

/// 点云是否 (近似) 共线
fn is_collinear(points: &[Point2]) -> bool {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x - cx;
        let dy = p.y - cy;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    // 2x2 协方差矩阵特征值
    let half_trace = (sxx + syy) / 2.0;
    let root = (((sxx - syy) / 2.0).powi(2) + sxy * sxy).sqrt();
    let l_max = half_trace + root;
    let l_min = half_trace - root;
    l_max <= 0.0 || l_min / l_max < COLLINEAR_RATIO
}

/// 高斯消元 (列主元) 求解 n×n 线性方程组
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    let mut matrix: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let mut row: Vec<f64> = a.row(i).to_vec();
            row.push(b[i]);
            row
        })
        .collect();

    for i in 0..n {
        // 找到主元
        let mut max_row = i;
        for j in (i + 1)..n {
            if matrix[j][i].abs() > matrix[max_row][i].abs() {
                max_row = j;
            }
        }

        // 交换行
        if max_row != i {
            matrix.swap(i, max_row);
        }

        // 检查奇异性
        if matrix[i][i].abs() < SINGULAR_EPS {
            return None;
        }

        // 消元
        for j in (i + 1)..n {
            let factor = matrix[j][i] / matrix[i][i];
            for k in i..=n {
                matrix[j][k] -= factor * matrix[i][k];
            }
        }
    }

    // 回代求解
    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        x[i] = matrix[i][n];
        for j in (i + 1)..n {
            x[i] -= matrix[i][j] * x[j];
        }
        x[i] /= matrix[i][i];
    }
    Some(x)
}

/// 从 ≥4 个对应点对估计单应性矩阵 (src → dst)
///
/// 归一化 DLT, 固定 h22 = 1; 超过4个点时求最小二乘解 (法方程)
pub fn estimate_homography(src: &[Point2], dst: &[Point2]) -> AnalyticsResult<Homography> {
    if src.len() != dst.len() {
        return Err(AnalyticsError::degenerate(format!(
            "{} source points but {} target points",
            src.len(),
            dst.len()
        )));
    }
    if src.len() < 4 {
        return Err(AnalyticsError::degenerate(format!(
            "need at least 4 correspondences, got {}",
            src.len()
        )));
    }
    if is_collinear(src) || is_collinear(dst) {
        return Err(AnalyticsError::degenerate("correspondence points are collinear"));
    }

    let t_src = normalization_transform(src)
        .ok_or_else(|| AnalyticsError::degenerate("source points coincide"))?;
    let t_dst = normalization_transform(dst)
        .ok_or_else(|| AnalyticsError::degenerate("target points coincide"))?;

    // 构建线性方程组 A h = b
    // [x y 1 0 0 0 -ux -uy] h = u
    // [0 0 0 x y 1 -vx -vy] h = v
    let n = src.len();
    let mut a = Array2::<f64>::zeros((2 * n, 8));
    let mut b = Array1::<f64>::zeros(2 * n);
    for (i, (s, d)) in src.iter().zip(dst).enumerate() {
        let (x, y) = t_src
            .transform_point(s.x, s.y)
            .ok_or_else(|| AnalyticsError::degenerate("normalization failed"))?;
        let (u, v) = t_dst
            .transform_point(d.x, d.y)
            .ok_or_else(|| AnalyticsError::degenerate("normalization failed"))?;

        let r = 2 * i;
        let row_u = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y];
        let row_v = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y];
        for k in 0..8 {
            a[[r, k]] = row_u[k];
            a[[r + 1, k]] = row_v[k];
        }
        b[r] = u;
        b[r + 1] = v;
    }

    // 法方程: (AᵀA) h = Aᵀb
    let ata = a.t().dot(&a);
    let atb = a.t().dot(&b);
    let h = solve_linear_system(&ata, &atb)
        .ok_or_else(|| AnalyticsError::degenerate("correspondence system is singular"))?;

    let normalized = Homography::from_array([
        [h[0], h[1], h[2]],
        [h[3], h[4], h[5]],
        [h[6], h[7], 1.0],
    ]);
    let t_dst_inv = t_dst
        .inverse()
        .ok_or_else(|| AnalyticsError::degenerate("normalization is not invertible"))?;
    let homography = t_dst_inv.compose(&normalized.compose(&t_src)).normalized();

    if homography.inverse().is_none() {
        return Err(AnalyticsError::degenerate("estimated projection is not invertible"));
    }
    Ok(homography)
}
